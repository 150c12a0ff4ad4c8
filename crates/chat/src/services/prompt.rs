//! Store manual given to the model as system instruction.

use askama::Template;

use techstore_core::SALE_MARKER;

/// System instruction template: persona, rules and catalog.
#[derive(Template)]
#[template(path = "prompts/store_manual.txt")]
struct StoreManualTemplate<'a> {
    store_name: &'a str,
    sale_marker: &'a str,
}

/// Render the store manual for `store_name`.
#[must_use]
pub fn render_store_manual(store_name: &str) -> String {
    StoreManualTemplate {
        store_name,
        sale_marker: SALE_MARKER,
    }
    .render()
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to render store manual");
        format!("Você é o assistente virtual da {store_name}.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_names_store_and_marker() {
        let manual = render_store_manual("TechStore");
        assert!(manual.contains("assistente virtual oficial da 'TechStore'"));
        assert!(manual.contains(SALE_MARKER));
        assert!(manual.contains("Mouse Sem Fio Logitech: R$ 80,00"));
    }

    #[test]
    fn test_manual_is_not_html_escaped() {
        let manual = render_store_manual("Loja \"Top\" & Cia");
        assert!(manual.contains("Loja \"Top\" & Cia"));
    }
}
