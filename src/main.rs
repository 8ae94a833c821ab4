use bevy::prelude::*;

mod camera;
mod clouds;
mod config;
mod flight;
mod flight_systems;
mod game;
mod scene_builder;
mod vehicle;
#[cfg(target_arch = "wasm32")]
mod windowmailer;

use flight_systems::*;
use game::FlightScene;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::*, JsCast};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::JsFuture;
#[cfg(target_arch = "wasm32")]
use web_sys::Response;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum AppState {
    LoadingConfig,
    Flying,
}

// The code here is not used in native builds
#[allow(dead_code)]
const CONFIG_DATA_CHANNEL: &str = "FLIGHT_CONFIG_DATA";
#[allow(dead_code)]
const CONFIG_ERROR_CHANNEL: &str = "FLIGHT_CONFIG_ERROR";

fn main() {
    // Native builds read the config before the app starts, wasm builds fetch
    // it and hold the scene back until it arrives.
    #[cfg(not(target_arch = "wasm32"))]
    let (default_state, config) = (
        AppState::Flying,
        config::config_or_default(config::read_config(config::CONFIG_PATH)),
    );
    #[cfg(target_arch = "wasm32")]
    let (default_state, config) = (AppState::LoadingConfig, config::FlightConfig::default());

    App::new()
        .insert_resource(WindowDescriptor {
            title: String::from("skyflight"),
            ..default()
        })
        .insert_resource(ClearColor::default())
        .insert_resource(AmbientLight::default())
        .insert_resource(FlightScene::new(config))
        .add_state(default_state)
        .add_plugins(DefaultPlugins)
        .add_startup_system(load_flight_config)
        .add_system_set(
            SystemSet::on_update(AppState::LoadingConfig)
                .with_system(flight_config_load_check)
        )
        .add_system_set(
            SystemSet::on_enter(AppState::Flying)
                .with_system(setup_flight_scene)
        )
        .add_system_set(
            SystemSet::on_update(AppState::Flying)
                .with_system(asset_status_system.label(FlightStage::Assets))
                .with_system(airplane_animation_system.after(FlightStage::Assets))
                .with_system(keyboard_input_system.label(FlightStage::Input).after(FlightStage::Assets))
                .with_system(flight_tick_system.label(FlightStage::Tick).after(FlightStage::Input))
        )
        .add_system(pixel_ratio_system)
        .add_system(window_resize_system)
        .run();
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from(format!("HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text()?).await?;
    return text.as_string().ok_or_else(|| JsValue::from_str("response body is not text"));
}

fn load_flight_config() {
    #[cfg(target_arch = "wasm32")]
    {
        let load_config = async move {
            let sent = match fetch_text(config::CONFIG_PATH).await {
                Ok(text) => windowmailer::send_message(CONFIG_DATA_CHANNEL, text),
                Err(e) => windowmailer::send_message(CONFIG_ERROR_CHANNEL, format!("{:?}", e)),
            };
            if let Err(e) = sent {
                error!("cannot deliver flight config: {:?}", e);
            }
        };

        wasm_bindgen_futures::spawn_local(load_config);
    }
}

#[allow(unused_mut, unused_variables)]
// Waits for the fetched config, then lets the scene start
fn flight_config_load_check(
    mut game: ResMut<FlightScene>,
    mut app_state: ResMut<State<AppState>>,
) {
    #[cfg(target_arch = "wasm32")]
    {
        let result = if windowmailer::message_count(CONFIG_DATA_CHANNEL) > 0 {
            match windowmailer::read_message(CONFIG_DATA_CHANNEL) {
                Some(text) => config::parse_config(&text),
                None => Err(config::ConfigError::Fetch(String::from("empty message"))),
            }
        } else if windowmailer::message_count(CONFIG_ERROR_CHANNEL) > 0 {
            let reason = windowmailer::read_message(CONFIG_ERROR_CHANNEL).unwrap_or_default();
            Err(config::ConfigError::Fetch(reason))
        } else {
            return;
        };

        game.config = config::config_or_default(result);

        if let Err(e) = app_state.set(AppState::Flying) {
            warn!("cannot leave config loading: {:?}", e);
        }
    }
}
