use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlElement, HtmlInputElement};

use crate::virtual_list::{
    compute_window, count_label, FilterEngine, FilteredView, FrameGate, NodePool, Record,
    RecordStore, RowSlot, OVERSCAN_ROWS, ROW_HEIGHT_PX,
};

#[derive(Deserialize)]
struct RecordPayload {
    key: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    href: String,
}

#[derive(Deserialize)]
struct DatasetPayload {
    #[serde(default)]
    records: Vec<RecordPayload>,
}

#[derive(Clone, Copy)]
enum ViewKind {
    Classes,
    WikiProjects,
}

struct ViewConfig {
    kind: ViewKind,
    scroll_id: &'static str,
    spacer_id: &'static str,
    container_id: &'static str,
    search_id: &'static str,
    count_id: &'static str,
    initial_data_id: &'static str,
    endpoint: String,
    reset_scroll_on_filter: bool,
}

enum RowCells {
    Classes {
        link: HtmlAnchorElement,
        label: Element,
    },
    Projects {
        name_link: HtmlAnchorElement,
        int_link: HtmlAnchorElement,
    },
}

struct DomRow {
    el: Element,
    cells: RowCells,
}

impl RowSlot for DomRow {
    fn bind(&mut self, record: &Record) {
        match &self.cells {
            RowCells::Classes { link, label } => {
                link.set_href(&record.href);
                link.set_text_content(Some(&record.key));
                label.set_text_content(Some(record.label()));
            }
            RowCells::Projects {
                name_link,
                int_link,
            } => {
                name_link.set_href(&record.href);
                name_link.set_text_content(Some(&record.key));
                let internal = format!(
                    "wikiproject.html?search={}",
                    js_sys::encode_uri_component(&record.key)
                );
                int_link.set_href(&internal);
                int_link.set_text_content(Some(&internal));
            }
        }
    }
}

impl Drop for DomRow {
    fn drop(&mut self) {
        self.el.remove();
    }
}

struct ListView {
    document: Document,
    kind: ViewKind,
    endpoint: String,
    initial_data_id: &'static str,
    reset_scroll_on_filter: bool,
    scroll_el: Option<HtmlElement>,
    spacer_el: Option<HtmlElement>,
    container_el: Option<HtmlElement>,
    search_el: Option<HtmlInputElement>,
    count_el: Option<Element>,
    store: RecordStore,
    filter: FilterEngine,
    view: FilteredView,
    pool: NodePool<DomRow>,
    gate: FrameGate,
    raf_closure: Option<Closure<dyn FnMut(f64)>>,
}

impl ListView {
    fn new(document: Document, config: ViewConfig) -> Self {
        let scroll_el = document
            .get_element_by_id(config.scroll_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let spacer_el = document
            .get_element_by_id(config.spacer_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let container_el = document
            .get_element_by_id(config.container_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let search_el = document
            .get_element_by_id(config.search_id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
        let count_el = document.get_element_by_id(config.count_id);

        let store = RecordStore::new();
        let view = FilteredView::full(&store);

        Self {
            document,
            kind: config.kind,
            endpoint: config.endpoint,
            initial_data_id: config.initial_data_id,
            reset_scroll_on_filter: config.reset_scroll_on_filter,
            scroll_el,
            spacer_el,
            container_el,
            search_el,
            count_el,
            store,
            filter: FilterEngine::new(),
            view,
            pool: NodePool::new(),
            gate: FrameGate::new(),
            raf_closure: None,
        }
    }
}

fn window() -> web_sys::Window {
    web_sys::window().expect("window")
}

fn create_row(document: &Document, container: &HtmlElement, kind: ViewKind) -> Option<DomRow> {
    let el = document.create_element("div").ok()?;
    el.set_class_name("vst-row");

    let cells = match kind {
        ViewKind::Classes => {
            let id_cell = document.create_element("div").ok()?;
            id_cell.set_class_name("vst-cell vst-cell-id");
            let link = document
                .create_element("a")
                .ok()?
                .dyn_into::<HtmlAnchorElement>()
                .ok()?;
            link.set_class_name("vst-id-link");
            id_cell.append_child(&link).ok()?;
            el.append_child(&id_cell).ok()?;

            let label = document.create_element("div").ok()?;
            label.set_class_name("vst-cell vst-cell-label");
            el.append_child(&label).ok()?;

            RowCells::Classes { link, label }
        }
        ViewKind::WikiProjects => {
            let name_cell = document.create_element("div").ok()?;
            name_cell.set_class_name("vst-cell vst-cell-name");
            let name_link = document
                .create_element("a")
                .ok()?
                .dyn_into::<HtmlAnchorElement>()
                .ok()?;
            name_link.set_class_name("vst-name-link");
            name_cell.append_child(&name_link).ok()?;
            el.append_child(&name_cell).ok()?;

            let link_cell = document.create_element("div").ok()?;
            link_cell.set_class_name("vst-cell vst-cell-intlink");
            let int_link = document
                .create_element("a")
                .ok()?
                .dyn_into::<HtmlAnchorElement>()
                .ok()?;
            int_link.set_class_name("vst-intlink");
            link_cell.append_child(&int_link).ok()?;
            el.append_child(&link_cell).ok()?;

            RowCells::Projects {
                name_link,
                int_link,
            }
        }
    };

    container.append_child(&el).ok()?;
    Some(DomRow { el, cells })
}

fn render_visible_rows(state: &mut ListView) {
    let (scroll_el, spacer_el, container_el) =
        match (&state.scroll_el, &state.spacer_el, &state.container_el) {
            (Some(scroll), Some(spacer), Some(container)) => {
                (scroll.clone(), spacer.clone(), container.clone())
            }
            _ => return,
        };

    let scroll_top = scroll_el.scroll_top() as f64;
    let client_height = scroll_el.client_height() as f64;
    let window = compute_window(
        scroll_top,
        client_height,
        ROW_HEIGHT_PX,
        OVERSCAN_ROWS,
        state.view.len(),
    );

    let _ = spacer_el
        .style()
        .set_property("height", &format!("{}px", window.total_height));
    let _ = container_el
        .style()
        .set_property("transform", &format!("translateY({}px)", window.offset_y));

    let document = state.document.clone();
    let kind = state.kind;
    state.pool.reconcile(&window, &state.view, || {
        create_row(&document, &container_el, kind)
    });
}

fn update_count(state: &ListView) {
    let count_el = match &state.count_el {
        Some(el) => el,
        None => return,
    };
    let label = count_label(state.view.len(), state.store.size());
    let html = match label.split_once(' ') {
        Some((shown, rest)) => format!("<strong>{}</strong> {}", shown, rest),
        None => format!("<strong>{}</strong>", label),
    };
    count_el.set_inner_html(&html);
}

fn install_frame_callback(state_rc: &Rc<RefCell<ListView>>) {
    let state_clone = Rc::clone(state_rc);
    let closure = Closure::wrap(Box::new(move |_ts: f64| {
        let mut state = state_clone.borrow_mut();
        render_visible_rows(&mut state);
        state.gate.finish();
    }) as Box<dyn FnMut(f64)>);
    state_rc.borrow_mut().raf_closure = Some(closure);
}

fn request_render(state_rc: &Rc<RefCell<ListView>>) {
    let mut state = state_rc.borrow_mut();
    if !state.gate.try_begin() {
        return;
    }
    match &state.raf_closure {
        Some(closure) => {
            let _ = window().request_animation_frame(closure.as_ref().unchecked_ref());
        }
        None => state.gate.finish(),
    }
}

fn apply_filter(state_rc: &Rc<RefCell<ListView>>) {
    {
        let mut state = state_rc.borrow_mut();
        let query = state
            .search_el
            .as_ref()
            .map(|input| input.value())
            .unwrap_or_default();
        state.filter.set_query(&query);
        let view = state.filter.apply(&state.store);
        state.view = view;
        update_count(&state);
        if state.reset_scroll_on_filter {
            if let Some(scroll_el) = &state.scroll_el {
                scroll_el.set_scroll_top(0);
            }
        }
    }
    request_render(state_rc);
}

fn apply_dataset(state_rc: &Rc<RefCell<ListView>>, records: Vec<Record>) {
    {
        let mut state = state_rc.borrow_mut();
        state.store.load(records);
        let query = state
            .search_el
            .as_ref()
            .map(|input| input.value())
            .unwrap_or_default();
        state.filter.set_query(&query);
        let view = state.filter.apply(&state.store);
        state.view = view;
        update_count(&state);
    }
    request_render(state_rc);
}

fn records_from_payload(payload: DatasetPayload) -> Vec<Record> {
    payload
        .records
        .into_iter()
        .map(|record| Record {
            key: record.key,
            columns: record.columns,
            href: record.href,
        })
        .collect()
}

fn read_initial_payload(document: &Document, initial_data_id: &str) -> Option<DatasetPayload> {
    let el = document.get_element_by_id(initial_data_id)?;
    let text = el.text_content().unwrap_or_default();
    if text.trim().is_empty() {
        return None;
    }
    let value = js_sys::JSON::parse(&text).ok()?;
    let payload: DatasetPayload = serde_wasm_bindgen::from_value(value).ok()?;
    el.remove();
    Some(payload)
}

async fn fetch_json(url: &str) -> Result<JsValue, JsValue> {
    let response = JsFuture::from(window().fetch_with_str(url)).await?;
    let response: web_sys::Response = response.dyn_into()?;
    if !response.ok() {
        let text = JsFuture::from(response.text()?).await?;
        let message = text
            .as_string()
            .unwrap_or_else(|| "Request failed".to_string());
        return Err(JsValue::from_str(&message));
    }
    JsFuture::from(response.json()?).await
}

async fn fetch_dataset(endpoint: &str) -> Result<DatasetPayload, JsValue> {
    let value = fetch_json(endpoint).await?;
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn load_dataset(state_rc: Rc<RefCell<ListView>>) {
    let (document, initial_data_id, endpoint) = {
        let state = state_rc.borrow();
        (
            state.document.clone(),
            state.initial_data_id,
            state.endpoint.clone(),
        )
    };

    if let Some(payload) = read_initial_payload(&document, initial_data_id) {
        apply_dataset(&state_rc, records_from_payload(payload));
        return;
    }

    spawn_local(async move {
        match fetch_dataset(&endpoint).await {
            Ok(payload) => apply_dataset(&state_rc, records_from_payload(payload)),
            // No usable dataset: fall back to the zero-row state.
            Err(_) => apply_dataset(&state_rc, Vec::new()),
        }
    });
}

fn wire_events(state_rc: &Rc<RefCell<ListView>>) {
    let (search_el, scroll_el) = {
        let state = state_rc.borrow();
        (state.search_el.clone(), state.scroll_el.clone())
    };

    if let Some(input) = &search_el {
        let state_clone = Rc::clone(state_rc);
        let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            apply_filter(&state_clone);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = input.add_event_listener_with_callback("input", handler.as_ref().unchecked_ref());
        handler.forget();

        let state_clone = Rc::clone(state_rc);
        let handler = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let key_event = match event.dyn_into::<web_sys::KeyboardEvent>() {
                Ok(event) => event,
                Err(_) => return,
            };
            if key_event.key() != "Escape" {
                return;
            }
            if let Some(target) = key_event
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
            {
                target.set_value("");
            }
            apply_filter(&state_clone);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = input.add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref());
        handler.forget();
    }

    if let Some(scroll_el) = &scroll_el {
        let state_clone = Rc::clone(state_rc);
        let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            request_render(&state_clone);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ =
            scroll_el.add_event_listener_with_callback("scroll", handler.as_ref().unchecked_ref());
        handler.forget();

        let state_clone = Rc::clone(state_rc);
        let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            request_render(&state_clone);
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ =
            window().add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref());
        handler.forget();
    }
}

fn init_view(document: &Document, config: ViewConfig) -> Option<Rc<RefCell<ListView>>> {
    // Pages host at most one of the two listings; skip the one that is absent.
    document.get_element_by_id(config.container_id)?;

    let state = ListView::new(document.clone(), config);
    let state_rc = Rc::new(RefCell::new(state));

    install_frame_callback(&state_rc);
    wire_events(&state_rc);

    {
        let mut state = state_rc.borrow_mut();
        let query = state
            .search_el
            .as_ref()
            .map(|input| input.value())
            .unwrap_or_default();
        state.filter.set_query(&query);
        update_count(&state);
    }

    load_dataset(Rc::clone(&state_rc));

    // First real computation waits a frame so the viewport has a measured
    // height.
    request_render(&state_rc);

    Some(state_rc)
}

fn read_language_param(window: &web_sys::Window) -> Option<String> {
    let search = window.location().search().ok()?;
    let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;
    params.get("language")
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = window();
    let document = window.document().expect("document");

    let classes_endpoint = match read_language_param(&window) {
        Some(language) => format!(
            "/api/classes?language={}",
            js_sys::encode_uri_component(&language)
        ),
        None => "/api/classes".to_string(),
    };

    init_view(
        &document,
        ViewConfig {
            kind: ViewKind::Classes,
            scroll_id: "classes-scroll",
            spacer_id: "classes-scroll-viewport",
            container_id: "classes-scroll-container",
            search_id: "classes-search",
            count_id: "classes-count",
            initial_data_id: "classes-initial-data",
            endpoint: classes_endpoint,
            reset_scroll_on_filter: false,
        },
    );

    init_view(
        &document,
        ViewConfig {
            kind: ViewKind::WikiProjects,
            scroll_id: "wp-scroll",
            spacer_id: "wp-scroll-viewport",
            container_id: "wp-scroll-container",
            search_id: "wp-search",
            count_id: "wp-count",
            initial_data_id: "wp-initial-data",
            endpoint: "/api/wikiprojects".to_string(),
            reset_scroll_on_filter: true,
        },
    );

    Ok(())
}
