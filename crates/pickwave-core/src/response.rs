//! # Responses
//!
//! Every operation answers with the state the scanner should move to, the
//! data that state needs, and an optional message.
//!
//! ## Scenario States
//! ```text
//! SelectingBatch ──find──► ConfirmStart ──confirm──► ScanProducts ◄──┐
//!       ▲                                                 │   │      │
//!       │                                                 │   └──────┘
//!       │                                                 ▼  scan / qty / dest
//!       └───────── batch done ◄──── UnloadAll | UnloadSingle
//! ```
//!
//! Messages carry a [`MessageKind`] with parameters; turning them into text
//! is the [`MessageCatalog`]'s job, applied once at the boundary by
//! [`Response::render`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::graph::BatchGraph;
use crate::message::MessageCatalog;
use crate::types::{BatchId, BatchState, Destination, OrderId, ProductId, Task, TaskId};

// =============================================================================
// States
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    SelectingBatch,
    ConfirmStart,
    ScanProducts,
    UnloadAll,
    UnloadSingle,
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// What a message says, without the words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum MessageKind {
    NoBatchAvailable,
    BatchNotFound,
    OperationNotFound,
    ProductNotFound,
    LocationNotFound,
    QuantityExceeded { requested: i64 },
    InvalidQuantity { quantity: i64 },
    DestinationNotAllowed,
    LineAlreadyPlaced,
    LineAlreadyUnloaded,
    UnableToPickMore { requested: i64 },
    ProductPlaced { quantity: i64, product: String, destination: String },
    ProductPacked { quantity: i64, product: String, package: String },
    ReturnedToSource { product: String, location: String },
    LineCancelled { product: String },
    UnloadConfirmed { destination: String },
    BatchCompleted { batch: String },
    NothingToUnload,
    ConcurrentUpdate,
    ServiceUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Kind(MessageKind),
    /// Text that is already meant for the worker, e.g. from the system of record.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Message {
    pub message_type: MessageType,
    pub body: MessageBody,
}

impl Message {
    pub fn new(message_type: MessageType, kind: MessageKind) -> Self {
        Message {
            message_type,
            body: MessageBody::Kind(kind),
        }
    }

    pub fn info(kind: MessageKind) -> Self {
        Message::new(MessageType::Info, kind)
    }

    pub fn success(kind: MessageKind) -> Self {
        Message::new(MessageType::Success, kind)
    }

    pub fn error(kind: MessageKind) -> Self {
        Message::new(MessageType::Error, kind)
    }

    pub fn literal(message_type: MessageType, text: impl Into<String>) -> Self {
        Message {
            message_type,
            body: MessageBody::Literal(text.into()),
        }
    }

    pub fn kind(&self) -> Option<&MessageKind> {
        match &self.body {
            MessageBody::Kind(kind) => Some(kind),
            MessageBody::Literal(_) => None,
        }
    }
}

// =============================================================================
// Context Data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchData {
    pub id: BatchId,
    pub name: String,
    pub state: BatchState,
    pub order_count: usize,
    pub task_count: usize,
}

impl BatchData {
    pub fn from_graph(graph: &BatchGraph) -> Self {
        BatchData {
            id: graph.batch.id,
            name: graph.batch.name.clone(),
            state: graph.batch.state,
            order_count: graph.orders.len(),
            task_count: graph.tasks.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DestinationData {
    pub destination: Destination,
    pub name: String,
}

impl DestinationData {
    pub fn resolve(graph: &BatchGraph, destination: Destination) -> Self {
        let name = match destination {
            Destination::Location(id) => graph.location(id).map(|l| l.name.clone()),
            Destination::Package(id) => graph.package(id).map(|p| p.name.clone()),
        };
        DestinationData {
            destination,
            name: name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaskData {
    pub id: TaskId,
    pub order_id: OrderId,
    pub order_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub requested_quantity: i64,
    pub done_quantity: i64,
    pub source_location: String,
    pub expected_destination: String,
    pub actual_destination: Option<DestinationData>,
    pub completed: bool,
}

impl TaskData {
    pub fn from_task(graph: &BatchGraph, task: &Task) -> Self {
        let location_name = |id| graph.location(id).map(|l| l.name.clone()).unwrap_or_default();
        TaskData {
            id: task.id,
            order_id: task.order_id,
            order_name: graph.order_of(task).map(|o| o.name.clone()).unwrap_or_default(),
            product_id: task.product_id,
            product_name: graph.product_of(task).map(|p| p.name.clone()).unwrap_or_default(),
            requested_quantity: task.requested_quantity,
            done_quantity: task.done_quantity,
            source_location: location_name(task.source_location),
            expected_destination: location_name(task.expected_destination),
            actual_destination: task
                .actual_destination
                .map(|destination| DestinationData::resolve(graph, destination)),
            completed: task.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanProductsData {
    pub batch: BatchData,
    /// The task to work on; absent once nothing is left to pick.
    pub task: Option<TaskData>,
    pub settled_task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnloadData {
    pub batch: BatchData,
    pub destination: DestinationData,
    pub tasks: Vec<TaskData>,
    /// Destinations still to unload, the presented one included.
    pub remaining_destinations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseData {
    Empty,
    Batch(BatchData),
    ScanProducts(ScanProductsData),
    Unload(UnloadData),
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Response {
    pub next_state: ScenarioState,
    pub data: ResponseData,
    pub message: Option<Message>,
}

impl Response {
    pub fn new(next_state: ScenarioState, data: ResponseData) -> Self {
        Response {
            next_state,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    /// Keeps an existing message; only fills an empty slot.
    pub fn or_message(mut self, message: Option<Message>) -> Self {
        if self.message.is_none() {
            self.message = message;
        }
        self
    }

    /// Replaces message kinds with catalog text for the wire.
    pub fn render(&self, catalog: &dyn MessageCatalog) -> RenderedResponse {
        RenderedResponse {
            next_state: self.next_state,
            data: self.data.clone(),
            message: self.message.as_ref().map(|message| RenderedMessage {
                message_type: message.message_type,
                body: match &message.body {
                    MessageBody::Kind(kind) => catalog.text(kind),
                    MessageBody::Literal(text) => text.clone(),
                },
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenderedMessage {
    pub message_type: MessageType,
    pub body: String,
}

/// Wire-level response shape sent to the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenderedResponse {
    pub next_state: ScenarioState,
    pub data: ResponseData,
    pub message: Option<RenderedMessage>,
}

// =============================================================================
// Unit Tests
// =============================================================================
