//! Sale marker detection in model output.
//!
//! The store manual instructs the model to append [`SALE_MARKER`] to its
//! answer when the customer confirms a purchase. The relay strips the marker
//! before the text reaches the customer and reports the sale.

/// Literal tag the model emits when a purchase is confirmed.
pub const SALE_MARKER: &str = "[SALE_CONFIRMED]";

/// Outcome of scanning a model response for the sale marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleDetection {
    /// No marker present; the text is returned unchanged.
    NoSale(String),
    /// Marker present; holds the text with every marker occurrence removed.
    Confirmed(String),
}

impl SaleDetection {
    /// Returns true if a sale was detected.
    #[must_use]
    pub const fn is_sale(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// The customer-visible text, without any marker.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::NoSale(text) | Self::Confirmed(text) => text,
        }
    }

    /// Consume the detection and return the customer-visible text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::NoSale(text) | Self::Confirmed(text) => text,
        }
    }
}

/// Scan model output for [`SALE_MARKER`].
///
/// All occurrences are removed and surrounding whitespace is trimmed, so a
/// marker on its own trailing line leaves no blank line behind.
#[must_use]
pub fn detect_sale(response: &str) -> SaleDetection {
    if response.contains(SALE_MARKER) {
        let stripped = response.replace(SALE_MARKER, "");
        SaleDetection::Confirmed(stripped.trim().to_owned())
    } else {
        SaleDetection::NoSale(response.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_marker_keeps_text_verbatim() {
        let detection = detect_sale("  O mouse custa R$ 80,00.\n");
        assert!(!detection.is_sale());
        assert_eq!(detection.text(), "  O mouse custa R$ 80,00.\n");
    }

    #[test]
    fn test_trailing_marker_is_stripped() {
        let detection = detect_sale("Pedido anotado: 1x Mouse.\n[SALE_CONFIRMED]");
        assert!(detection.is_sale());
        assert_eq!(detection.into_text(), "Pedido anotado: 1x Mouse.");
    }

    #[test]
    fn test_every_occurrence_is_stripped() {
        let detection = detect_sale("[SALE_CONFIRMED] Teclado [SALE_CONFIRMED] ok");
        assert_eq!(detection, SaleDetection::Confirmed("Teclado  ok".to_owned()));
    }

    #[test]
    fn test_marker_match_is_case_sensitive() {
        assert!(!detect_sale("[sale_confirmed]").is_sale());
    }
}
