//! Downloadable analysis script

/// Bundled Python script calling the analyze endpoint
pub const DEFAULT_SCRIPT_TEMPLATE: &str = include_str!("../../assets/analyze.py");

const ENDPOINT: &str = "<endpoint>";
const SUBSCRIPTION_KEY: &str = "<subsription_key>";
const MODEL_ID: &str = "<model_id>";

/// Fill in the template placeholders, matching them case-insensitively
pub fn render_script(template: &str, endpoint: &str, api_key: &str, model_id: &str) -> String {
    let replacements = [(ENDPOINT, endpoint), (SUBSCRIPTION_KEY, api_key), (MODEL_ID, model_id)];
    // ASCII lowering keeps byte offsets aligned with `template`
    let lower = template.to_ascii_lowercase();
    let mut output = String::with_capacity(template.len());
    let mut i = 0;

    while i < template.len() {
        let rest = &lower[i..];
        if let Some((placeholder, value)) = replacements.iter().find(|(p, _)| rest.starts_with(p)) {
            output.push_str(value);
            i += placeholder.len();
            continue;
        }

        match template[i..].chars().next() {
            Some(ch) => {
                output.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    output
}

/// `analysis` + first four characters of the model id
pub fn script_file_name(model_id: &str) -> String {
    format!("analysis{}.py", model_id.chars().take(4).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_placeholders_ignoring_case() {
        let template = "url=<ENDPOINT> key=<Subsription_Key> model=<model_id> again=<model_ID> ü";

        let script = render_script(template, "https://fr.example.com", "secret", "1234abcd");

        assert_eq!(
            script,
            "url=https://fr.example.com key=secret model=1234abcd again=1234abcd ü"
        );
    }

    #[test]
    fn test_bundled_template_has_placeholders() {
        let script = render_script(DEFAULT_SCRIPT_TEMPLATE, "E", "K", "M");

        assert!(!script.contains("<endpoint>"));
        assert!(!script.contains("<subsription_key>"));
        assert!(!script.contains("<model_id>"));
        assert!(script.contains("model_id = \"M\""));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(script_file_name("f2f1c4ad-1f5c"), "analysisf2f1.py");
        assert_eq!(script_file_name("ab"), "analysisab.py");
    }
}
