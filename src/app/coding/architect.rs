use crate::domain::model::{FilePlan, PlannedFile};
use crate::utils::error::Result;
use crate::utils::text::parse_json_reply;
use serde_json::{Map, Value};

pub fn architect_prompt(request: &str) -> String {
    format!(
        r#"You are a Senior System Architect & CTO with 25+ years of experience.
Design a PRODUCTION-READY, SCALABLE file structure for: "{request}".

CRITICAL RULES:
1. No Nested Root: Return keys as relative paths (e.g., "index.html", "style.css"). Do NOT create a top-level folder inside the JSON.
2. Complete Connectivity: Ensure HTML files link to the correct CSS/JS paths.
   - For simple sites, keep `index.html` and `style.css` in the SAME directory.
3. Modern Stack - SIMPLE APPROACH:
   - Web: Use Tailwind CSS via CDN ONLY. NO build process, NO PostCSS, NO npm for simple sites.
   - Python: Use Pytest.
4. Minimal Config: For simple web projects, ONLY include: index.html, style.css (optional), app.js (optional), .gitignore.
   - Do NOT include package.json unless it's a complex Node.js app.
   - Do NOT include build tools for simple landing pages.

Return ONLY a JSON object mapping each relative path to a short description of its purpose.
Example for simple site:
{{
    "index.html": "Landing page markup",
    "style.css": "Optional custom styles",
    "app.js": "Optional interactivity"
}}
"#
    )
}

/// Parse the architect's `{path: purpose}` object, keeping its key order.
pub fn parse_file_plan(raw: &str) -> Result<FilePlan> {
    let object: Map<String, Value> = parse_json_reply(raw, "file plan")?;
    let entries = object
        .into_iter()
        .map(|(path, purpose)| PlannedFile {
            path,
            purpose: match purpose {
                Value::String(text) => text,
                other => other.to_string(),
            },
        })
        .collect();
    Ok(FilePlan { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_keeps_architect_order() {
        let raw = "```json\n{\"index.html\": \"Markup\", \"app.js\": \"Logic\", \"assets/\": \"Images\"}\n```";
        let plan = parse_file_plan(raw).unwrap();

        assert_eq!(plan.paths(), vec!["index.html", "app.js", "assets/"]);
        assert_eq!(plan.entries[1].purpose, "Logic");
        assert!(plan.entries[2].is_directory());
    }

    #[test]
    fn test_non_string_purpose_is_kept_as_json() {
        let plan = parse_file_plan(r#"{"config.json": {"port": 8080}}"#).unwrap();
        assert_eq!(plan.entries[0].purpose, r#"{"port":8080}"#);
    }

    #[test]
    fn test_prose_only_reply_fails() {
        assert!(parse_file_plan("Sure! Here is a plan: index.html and style.css").is_err());
    }
}
