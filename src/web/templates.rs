//! HTML templates for the browser UI.
//!
//! Templates are embedded at compile time using `include_str!`.

/// The page shell. `{{user_selector}}` and `{{task_section}}` are filled in
/// per request.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// Render the page shell with its dynamic parts.
pub fn render_index(user_selector: &str, task_section: &str) -> String {
    INDEX_TEMPLATE
        .replace("{{user_selector}}", user_selector)
        .replace("{{task_section}}", task_section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_replaced() {
        let html = render_index("<select></select>", "<section></section>");

        assert!(!html.contains("{{"));
        assert!(html.contains("<select></select>"));
        assert!(html.contains("<section></section>"));
    }
}
