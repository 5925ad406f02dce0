//! Browser Geolocation API sensor

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{GeolocationPosition, GeolocationPositionError, PositionOptions};

use super::LocationSensor;
use crate::config::FixOptions;
use crate::domain::models::Coordinate;
use crate::shared::LocationError;

type FixSender = Rc<RefCell<Option<oneshot::Sender<Result<Coordinate, LocationError>>>>>;

/// `navigator.geolocation.getCurrentPosition` wrapped as a future
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserGeolocation;

#[async_trait(?Send)]
impl LocationSensor for BrowserGeolocation {
    async fn get_fix(&self, options: &FixOptions) -> Result<Coordinate, LocationError> {
        let geolocation = web_sys::window()
            .ok_or(LocationError::Unavailable)?
            .navigator()
            .geolocation()
            .map_err(|_| LocationError::Unavailable)?;

        let (tx, rx) = oneshot::channel();
        let sender: FixSender = Rc::new(RefCell::new(Some(tx)));

        let success_sender = Rc::clone(&sender);
        let on_success = Closure::<dyn FnMut(GeolocationPosition)>::new(
            move |position: GeolocationPosition| {
                let coords = position.coords();
                if let Some(tx) = success_sender.borrow_mut().take() {
                    let _ = tx.send(Ok(Coordinate::new(coords.latitude(), coords.longitude())));
                }
            },
        );

        let error_sender = Rc::clone(&sender);
        let on_error = Closure::<dyn FnMut(GeolocationPositionError)>::new(
            move |error: GeolocationPositionError| {
                if let Some(tx) = error_sender.borrow_mut().take() {
                    let _ = tx.send(Err(LocationError::from_platform_code(error.code())));
                }
            },
        );

        let position_options = PositionOptions::new();
        position_options.set_enable_high_accuracy(options.high_accuracy);
        position_options.set_timeout(options.timeout.as_millis() as u32);
        position_options.set_maximum_age(options.max_cache_age.as_millis() as u32);

        geolocation
            .get_current_position_with_error_callback_and_options(
                on_success.as_ref().unchecked_ref::<js_sys::Function>(),
                Some(on_error.as_ref().unchecked_ref::<js_sys::Function>()),
                &position_options,
            )
            .map_err(|_| LocationError::Unavailable)?;

        // Closures must outlive the callback; they drop when this future completes
        let result = rx.await.unwrap_or(Err(LocationError::Unavailable));
        drop(on_success);
        drop(on_error);
        result
    }
}
