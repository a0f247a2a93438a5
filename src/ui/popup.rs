/// Popup UI for the Quick QR Scan extension

use crate::decode;
use crate::history::ScanHistory;
use crate::platform::{ExtensionApi, copy_to_clipboard};
use crate::scan_data::{ScanRecord, TabInfo};
use crate::storage::StorageAdapter;
use chrono::Local;
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// One scan invocation walks Idle -> Capturing -> Decoding -> terminal
/// state and back to Idle; the scan button is disabled in between.
#[derive(Clone, PartialEq)]
enum ScanState {
    Idle,
    Capturing,
    Decoding,
    Found(String),
    NotFound,
    Failed(String),
}

impl ScanState {
    fn busy(&self) -> bool {
        matches!(self, ScanState::Capturing | ScanState::Decoding)
    }

    fn status_text(&self) -> Option<String> {
        match self {
            ScanState::Idle => None,
            ScanState::Capturing => Some("Capturing visible area...".to_string()),
            ScanState::Decoding => Some("Decoding QR code...".to_string()),
            ScanState::Found(_) => Some("QR code found!".to_string()),
            ScanState::NotFound => Some("No QR code found.".to_string()),
            ScanState::Failed(message) => Some(message.clone()),
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| ScanState::Idle);
    let history = use_state(ScanHistory::new);

    // Load persisted history on mount
    {
        let history = history.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match StorageAdapter::detect() {
                    Ok(storage) => {
                        let mut loaded = (*history).clone();
                        loaded.load(&storage).await;
                        history.set(loaded);
                    }
                    Err(err) => {
                        log::warn!("persisted history unavailable: {err}");
                    }
                }
            });
            || ()
        });
    }

    // Scan handler
    let on_scan = {
        let state = state.clone();
        let history = history.clone();

        Callback::from(move |_| {
            // The button is disabled while a scan is in flight; a stray
            // second trigger is ignored outright.
            if state.busy() {
                return;
            }

            let state = state.clone();
            let history = history.clone();

            state.set(ScanState::Capturing);
            spawn_local(async move {
                run_scan(state, history).await;
            });
        })
    };

    // Delete one history entry
    let on_delete = {
        let history = history.clone();

        Callback::from(move |id: String| {
            let mut updated = (*history).clone();
            if updated.remove_by_id(&id) {
                history.set(updated.clone());

                spawn_local(async move {
                    match StorageAdapter::detect() {
                        Ok(storage) => updated.save(&storage).await,
                        Err(err) => log::warn!("history not persisted: {err}"),
                    }
                });
            }
        })
    };

    let is_busy = state.busy();

    html! {
        <div class="popup">
            <h1 class="popup-title">{"Quick QR Scan"}</h1>

            <Button onclick={on_scan} disabled={is_busy} block={true}>
                {"📷 Scan visible area"}
            </Button>

            // Status display
            {match &*state {
                ScanState::Capturing | ScanState::Decoding => html! {
                    <div class="status-row">
                        <Spinner />
                        <p class="status-text">{state.status_text().unwrap_or_default()}</p>
                    </div>
                },
                ScanState::Failed(message) => html! {
                    <Alert r#type={AlertType::Danger} title={"Scan failed"} inline={true}>
                        {message.clone()}
                    </Alert>
                },
                _ => html! {
                    if let Some(status) = state.status_text() {
                        <p class="status-text">{status}</p>
                    }
                },
            }}

            // Decoded payload
            if let ScanState::Found(text) = &*state {
                <div class="result-box">
                    <span class="result-label">{"Result:"}</span>
                    <span class="result-text">{text.clone()}</span>
                </div>
            }

            <div class="history-section">
                <h2 class="history-title">{"Scan history"}</h2>
                <HistoryList records={history.records().to_vec()} on_delete={on_delete} />
            </div>
        </div>
    }
}

/// Drive one scan from capture to rendered history entry. Every failure
/// path lands in a terminal state that re-enables the button.
async fn run_scan(state: UseStateHandle<ScanState>, history: UseStateHandle<ScanHistory>) {
    let api = match ExtensionApi::detect() {
        Ok(api) => api,
        Err(err) => {
            log::warn!("{err}");
            state.set(ScanState::Failed("Failed to capture visible area.".to_string()));
            return;
        }
    };

    let data_url = match api.capture_visible_tab().await {
        Ok(data_url) => data_url,
        Err(err) => {
            log::warn!("{err}");
            state.set(ScanState::Failed("Failed to capture visible area.".to_string()));
            return;
        }
    };

    state.set(ScanState::Decoding);

    let decoded = match decode::decode_data_url(&data_url) {
        Ok(decoded) => decoded,
        Err(err) => {
            log::warn!("{err}");
            state.set(ScanState::Failed("Error decoding QR code.".to_string()));
            return;
        }
    };

    let Some(text) = decoded else {
        state.set(ScanState::NotFound);
        return;
    };

    state.set(ScanState::Found(text.clone()));

    copy_to_clipboard(&text).await;

    let tab = match api.active_tab().await {
        Ok(tab) => tab.unwrap_or_default(),
        Err(err) => {
            log::warn!("could not get active tab info: {err}");
            TabInfo::default()
        }
    };

    let mut updated = (*history).clone();
    updated.add(&text, &tab.title, &tab.url);
    history.set(updated.clone());

    // Fire-and-forget persistence: the rendered list never waits on it.
    match StorageAdapter::detect() {
        Ok(storage) => updated.save(&storage).await,
        Err(err) => log::warn!("history not persisted: {err}"),
    }
}

#[derive(Properties, PartialEq)]
struct HistoryListProps {
    records: Vec<ScanRecord>,
    on_delete: Callback<String>,
}

#[function_component(HistoryList)]
fn history_list(props: &HistoryListProps) -> Html {
    if props.records.is_empty() {
        return html! {
            <p class="history-empty">{"No scans yet."}</p>
        };
    }

    html! {
        <ul class="history-list">
            {for props.records.iter().map(|record| html! {
                <HistoryItem
                    key={record.id.clone()}
                    record={record.clone()}
                    on_delete={props.on_delete.clone()}
                />
            })}
        </ul>
    }
}

#[derive(Properties, PartialEq)]
struct HistoryItemProps {
    record: ScanRecord,
    on_delete: Callback<String>,
}

#[function_component(HistoryItem)]
fn history_item(props: &HistoryItemProps) -> Html {
    let record = &props.record;

    let title = if record.tab_title.is_empty() {
        "(No title)".to_string()
    } else {
        record.tab_title.clone()
    };
    let time = record
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();

    html! {
        <li class="history-item">
            <div class="history-item-body">
                <div class="history-title-row">
                    <span class="history-tab-title" title={record.tab_url.clone()}>{title}</span>
                    <span class="history-time">{time}</span>
                </div>
                <div class="history-text">{record.text.clone()}</div>
            </div>
            <Button
                variant={ButtonVariant::Danger}
                onclick={props.on_delete.reform({
                    let id = record.id.clone();
                    move |_| id.clone()
                })}
            >
                {"✕"}
            </Button>
        </li>
    }
}
