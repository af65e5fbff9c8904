//! Per-sink record filters
//!
//! A [`Filter`] is a pure predicate over a [`LogRecord`]. Every filter built
//! here honours the `disable_all` extra flag; class filters also honour the
//! flag matching their sink class, so a caller can keep a single record out
//! of e.g. the file sinks with `logger.bind("disable_file", true)`.

use super::record::LogRecord;
use std::fmt;
use std::sync::Arc;

pub const DISABLE_ALL: &str = "disable_all";
pub const HTTP_INFO_KEY: &str = "http_info";

/// Routing class of a default sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkClass {
    Std,
    File,
    FileErr,
    FileJson,
    FileJsonErr,
}

impl SinkClass {
    /// Extra flag that disables delivery to this class
    pub fn disable_flag(&self) -> &'static str {
        match self {
            SinkClass::Std => "disable_std",
            SinkClass::File => "disable_file",
            SinkClass::FileErr => "disable_file_err",
            SinkClass::FileJson => "disable_file_json",
            SinkClass::FileJsonErr => "disable_file_json_err",
        }
    }
}

type Predicate = dyn Fn(&LogRecord) -> bool + Send + Sync;

#[derive(Clone)]
pub struct Filter {
    predicate: Arc<Predicate>,
}

impl Filter {
    /// Wrap a caller predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&LogRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Accepts everything not flagged `disable_all`
    pub fn all() -> Self {
        Self::new(|record| !record.extra().flag(DISABLE_ALL))
    }

    pub fn for_class(class: SinkClass) -> Self {
        let flag = class.disable_flag();
        Self::new(move |record| {
            let extra = record.extra();
            !extra.flag(DISABLE_ALL) && !extra.flag(flag)
        })
    }

    /// Accepts only records carrying HTTP access metadata
    pub fn http() -> Self {
        Self::new(|record| {
            let extra = record.extra();
            !extra.flag(DISABLE_ALL) && extra.contains_key(HTTP_INFO_KEY)
        })
    }

    /// Both filters must accept
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        Self::new(move |record| self.accepts(record) && other.accepts(record))
    }

    pub fn accepts(&self, record: &LogRecord) -> bool {
        (self.predicate)(record)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}
