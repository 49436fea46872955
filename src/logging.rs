//! Logging macros.
//!
//! With the `defmt` feature they forward to defmt. Without it the arguments
//! are still type-checked but nothing is emitted, so host tests link without a
//! global logger. Format strings must stay within the `{}` / `{:?}` subset both
//! backends understand.

#[cfg(feature = "defmt")]
macro_rules! log_info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_error {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}
