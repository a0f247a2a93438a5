/// Quick QR Scan - browser extension popup that captures the visible tab
/// area and decodes QR codes
/// Built with Rust + WASM + Yew

mod decode;
mod error;
mod history;
mod platform;
mod scan_data;
mod storage;
pub mod ui;

#[cfg(feature = "cli")]
pub mod packager;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the decoder for JavaScript access
#[wasm_bindgen]
pub fn decode_qr(image_bytes: &[u8]) -> Option<String> {
    decode::decode_image(image_bytes).unwrap_or_else(|err| {
        log::warn!("{err}");
        None
    })
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
