pub mod clock;
pub mod dir;
pub mod logging;
pub mod percentage;
pub mod round;
pub mod runtime;
pub mod time;
