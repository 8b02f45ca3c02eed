//! # Message Catalog
//!
//! Turns [`MessageKind`]s into worker-facing text. The workflow only ever
//! emits kinds and parameters; localisation plugs in here.

use crate::response::MessageKind;

pub trait MessageCatalog {
    fn text(&self, kind: &MessageKind) -> String;
}

/// Built-in English texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl MessageCatalog for EnglishCatalog {
    fn text(&self, kind: &MessageKind) -> String {
        match kind {
            MessageKind::NoBatchAvailable => {
                "No more work to do, please create a new batch transfer".to_string()
            }
            MessageKind::BatchNotFound => {
                "This batch cannot be found or is no longer yours, please start again".to_string()
            }
            MessageKind::OperationNotFound => "This operation does not exist anymore".to_string(),
            MessageKind::ProductNotFound => "Barcode does not match the product to pick".to_string(),
            MessageKind::LocationNotFound => "No location or package found for this barcode".to_string(),
            MessageKind::QuantityExceeded { requested } => {
                format!("You cannot pick more than {}", requested)
            }
            MessageKind::InvalidQuantity { quantity } => {
                format!("{} is not a valid quantity", quantity)
            }
            MessageKind::DestinationNotAllowed => "You cannot place the goods here".to_string(),
            MessageKind::LineAlreadyPlaced => "This line is already placed".to_string(),
            MessageKind::LineAlreadyUnloaded => {
                "These goods are already unloaded and cannot be taken back".to_string()
            }
            MessageKind::UnableToPickMore { requested } => {
                format!("Unable to pick more than {}", requested)
            }
            MessageKind::ProductPlaced {
                quantity,
                product,
                destination,
            } => format!("{} {} put in {}", quantity, product, destination),
            MessageKind::ProductPacked {
                quantity,
                product,
                package,
            } => format!("{} {} packed in {}", quantity, product, package),
            MessageKind::ReturnedToSource { product, location } => {
                format!("{} put back in {}", product, location)
            }
            MessageKind::LineCancelled { product } => format!("{} is back to pick", product),
            MessageKind::UnloadConfirmed { destination } => {
                format!("Goods unloaded in {}", destination)
            }
            MessageKind::BatchCompleted { batch } => format!("Batch {} is done", batch),
            MessageKind::NothingToUnload => "Nothing left to unload in this batch".to_string(),
            MessageKind::ConcurrentUpdate => {
                "Someone else changed this line in the meantime, please retry".to_string()
            }
            MessageKind::ServiceUnavailable => {
                "The picking service is unavailable, please retry".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameterised_texts() {
        let catalog = EnglishCatalog;
        assert_eq!(
            catalog.text(&MessageKind::ProductPlaced {
                quantity: 3,
                product: "Widget".to_string(),
                destination: "OUT/BAY-1".to_string(),
            }),
            "3 Widget put in OUT/BAY-1"
        );
        assert_eq!(
            catalog.text(&MessageKind::UnableToPickMore { requested: 6 }),
            "Unable to pick more than 6"
        );
    }
}
