// Content-risk signals — raw readings and the providers that produce them.
//
// Every external model sits behind the SignalProvider trait and reports a
// SignalReading. Model quirks (ranges, sign conventions, missing values)
// stay in here; the scoring core only ever sees readings.

pub mod feed;
pub mod keywords;
pub mod perspective;
pub mod rate_limiter;
pub mod reading;
pub mod traits;
