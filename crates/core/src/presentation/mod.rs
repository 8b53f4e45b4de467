pub mod kiosk;
pub mod kiosk_state;
