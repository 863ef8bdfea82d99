const INDEX_TEMPLATE: &str = include_str!("index.html");
const CLASSES_TEMPLATE: &str = include_str!("classes.html");
const WIKIPROJECTS_TEMPLATE: &str = include_str!("wikiprojects.html");
const INITIAL_SCRIPT_TOKEN: &str = "{{initial_script}}";
const CACHE_BUST_TOKEN: &str = "{{cache_bust}}";

pub fn render_index(cache_bust: &str) -> String {
    INDEX_TEMPLATE.replace(CACHE_BUST_TOKEN, cache_bust)
}

pub fn render_classes(cache_bust: &str, initial_payload: Option<&str>) -> String {
    render_listing(
        CLASSES_TEMPLATE,
        cache_bust,
        "classes-initial-data",
        initial_payload,
    )
}

pub fn render_wikiprojects(cache_bust: &str, initial_payload: Option<&str>) -> String {
    render_listing(
        WIKIPROJECTS_TEMPLATE,
        cache_bust,
        "wp-initial-data",
        initial_payload,
    )
}

fn render_listing(
    template: &str,
    cache_bust: &str,
    initial_data_id: &str,
    initial_payload: Option<&str>,
) -> String {
    let initial_script = initial_payload
        .map(|payload| {
            format!(
                r#"    <script id="{}" type="application/json">{}</script>"#,
                initial_data_id, payload
            )
        })
        .unwrap_or_default();

    template
        .replace(CACHE_BUST_TOKEN, cache_bust)
        .replace(INITIAL_SCRIPT_TOKEN, &initial_script)
}
