//! Per-file code generation and the heuristics that clean up what the coder
//! returns before it is written to disk.

use crate::core::session::Session;
use crate::domain::model::{PlannedFile, Seat};
use crate::utils::text::{first_json_object, strip_code_fences};

/// 模型常見的離題內容 (範例 API、供應商名稱)
pub const OFF_TOPIC_MARKERS: &[&str] = &["groq", "api example", "llama-3", "@groq/cli", "fetch('/api"];

const TAILWIND_CLASS_MARKERS: &[&str] = &["class=\"flex", "class=\"grid", "class=\"bg-", "class=\"text-"];
const TAILWIND_CDN_HOST: &str = "cdn.tailwindcss.com";
const TAILWIND_CDN_TAG: &str = "    <script src=\"https://cdn.tailwindcss.com\"></script>\n</head>";

const LANDING_REMINDER: &str = "\n\nREMINDER: This is a LANDING PAGE. You MUST include: Hero section, \
Features section, About section, and Footer. Generate COMPLETE HTML, not a skeleton.";

pub fn coder_prompt(request: &str, file: &PlannedFile) -> String {
    let path = &file.path;
    let purpose = &file.purpose;
    format!(
        r#"You are a Senior Full Stack Developer (Top 1% Talent).

PROJECT CONTEXT: {request}
FILE TO CREATE: {path}
FILE PURPOSE: {purpose}

YOUR TASK: Write the COMPLETE, PRODUCTION-READY code for "{path}" that is part of the project: "{request}".

CRITICAL RULES:
1. STAY ON TOPIC: The code MUST be relevant to "{request}". DO NOT write examples about APIs, model providers, or unrelated topics.
2. COMPLETENESS - NO SKELETONS:
   - For HTML landing pages, you MUST include ALL sections:
     * Hero section with headline, description, and CTA button
     * Features/Products section with at least 3 items
     * About/Benefits section
     * Testimonials or social proof (optional but recommended)
     * Contact/CTA section
     * Footer
   - Each section must have REAL content, not placeholders
3. IMAGES: NEVER use local paths. ALWAYS USE: `https://placehold.co/600x400?text=YourText`
4. Robustness: Handle errors, add comments, use semantic HTML/Python type hinting.
5. No TODOs: Do not leave "TODO" or "Rest of code here". Write it all.
6. Modern UI:
   - MUST USE TAILWIND CSS: Add `<script src="https://cdn.tailwindcss.com"></script>` in HTML <head>
   - Use vibrant colors and gradients, Google Fonts (Inter or Playfair Display)
   - Use premium effects: backdrop-blur, shadow-2xl, rounded-2xl, hover effects
   - Generous whitespace and modern flexbox/grid layouts with full-screen hero sections
7. NO INVALID SYNTAX:
   - Do NOT use `import` statements in HTML <script> tags
   - Do NOT use JSX or React syntax unless this is explicitly a React project
8. Single File ONLY: Return ONLY the content for "{path}". Do NOT include other files.
9. Connectivity: If this is HTML, link CSS/JS files correctly (e.g., `<link rel="stylesheet" href="style.css">`).

Return ONLY the code for {path}. No explanations, no markdown blocks.
"#
    )
}

pub fn is_off_topic(code: &str) -> bool {
    let lower = code.to_lowercase();
    OFF_TOPIC_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Drop ES module import lines from HTML; they break inline `<script>` tags.
/// Returns `None` when there is nothing to remove.
pub fn remove_module_imports(html: &str) -> Option<String> {
    if !(html.contains("import ") && html.contains("<script")) {
        return None;
    }
    let kept: Vec<&str> = html
        .split('\n')
        .filter(|line| !(line.contains("import ") && line.contains("from ")))
        .collect();
    Some(kept.join("\n"))
}

/// Add the Tailwind CDN script before `</head>` when utility classes are used
/// without it. Returns `None` when no change was made.
pub fn inject_tailwind_cdn(html: &str) -> Option<String> {
    let uses_tailwind = TAILWIND_CLASS_MARKERS.iter().any(|m| html.contains(m));
    if !uses_tailwind || html.contains(TAILWIND_CDN_HOST) || !html.contains("</head>") {
        return None;
    }
    Some(html.replace("</head>", TAILWIND_CDN_TAG))
}

pub fn is_landing_request(request: &str) -> bool {
    let lower = request.to_lowercase();
    ["landing", "page", "website"].iter().any(|w| lower.contains(w))
}

/// Hero and feature sections present and the page is not a bare skeleton.
pub fn is_complete_landing_page(html: &str, min_chars: usize) -> bool {
    let lower = html.to_lowercase();
    let has_hero = ["hero", "<h1", "headline"].iter().any(|m| lower.contains(m));
    let has_features = lower.contains("feature") || lower.contains("product");
    has_hero && has_features && html.chars().count() >= min_chars
}

/// Cut anything the model appended after the closing `</html>`.
pub fn truncate_after_html(html: &str) -> &str {
    match html.find("</html>") {
        Some(idx) => &html[..idx + "</html>".len()],
        None => html,
    }
}

/// Keep only the `{...}` document when it parses on its own.
pub fn extract_json_document(text: &str) -> &str {
    match first_json_object(text) {
        Some(candidate) if serde_json::from_str::<serde_json::Value>(candidate).is_ok() => candidate,
        _ => text,
    }
}

/// Generate one planned file: coder seat first, tertiary seat for retries.
pub async fn generate_file(
    session: &mut Session<'_>,
    request: &str,
    file: &PlannedFile,
    min_landing_chars: usize,
) -> String {
    let prompt = coder_prompt(request, file);
    let label = format!("code {}", file.path);
    let mut code = strip_code_fences(&session.consult(Seat::Secondary, &label, &prompt).await);

    if is_off_topic(&code) {
        session.say("     ⚠️ Detected irrelevant content. Retrying with the tertiary seat...");
        code = strip_code_fences(&session.consult(Seat::Tertiary, &label, &prompt).await);
    }

    let path = file.path.to_lowercase();
    if path.ends_with(".html") {
        if let Some(cleaned) = remove_module_imports(&code) {
            session.say("     ⚠️ Detected invalid import statements in HTML. Removing...");
            code = cleaned;
        }
        if let Some(patched) = inject_tailwind_cdn(&code) {
            session.say("     ⚠️ Tailwind classes detected but CDN missing. Adding...");
            code = patched;
        }
        if is_landing_request(request) && !is_complete_landing_page(&code, min_landing_chars) {
            session.say(&format!(
                "     ⚠️ Landing page appears incomplete (size: {} chars). Retrying with the tertiary seat...",
                code.chars().count()
            ));
            let reminder = format!("{}{}", prompt, LANDING_REMINDER);
            code = strip_code_fences(&session.consult(Seat::Tertiary, &label, &reminder).await);
        }
        code = truncate_after_html(&code).to_string();
    }

    if path.ends_with(".json") {
        code = extract_json_document(&code).to_string();
    }

    code
}
