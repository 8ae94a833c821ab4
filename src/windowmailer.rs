use wasm_bindgen::prelude::*;
use js_sys::{Array, Map, Reflect};

const MAIL_VAR: &str = "WINDOW_MAILER_MAILBOX";

// Channels live in a Map stored on `window`, created on first use.
fn mailbox() -> Result<Map, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let mail_var = JsValue::from(MAIL_VAR);

    if !Reflect::has(&window, &mail_var)? {
        Reflect::set(&window, &mail_var, &Map::new())?;
    }

    Ok(Reflect::get(&window, &mail_var)?.into())
}

fn channel(channel_name: &str) -> Result<Array, JsValue> {
    let map = mailbox()?;
    let channel_name = JsValue::from(channel_name);

    if !map.has(&channel_name) {
        map.set(&channel_name, &Array::new());
    }

    Ok(map.get(&channel_name).into())
}

pub fn send_message(channel_name: &str, message: String) -> Result<(), JsValue> {
    channel(channel_name)?.push(&JsValue::from(message));
    Ok(())
}

pub fn message_count(channel_name: &str) -> u32 {
    match channel(channel_name) {
        Ok(messages) => messages.length(),
        _ => 0,
    }
}

/// Pops the oldest message of the channel.
pub fn read_message(channel_name: &str) -> Option<String> {
    channel(channel_name).ok()?.shift().as_string()
}
