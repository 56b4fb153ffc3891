use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A named value that can be spliced into ticker text.
pub trait TextFeed: Send + Sync {
    /// Current value of the feed.
    fn current(&self) -> String;
}

/// Feed whose value never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticFeed(pub String);

impl TextFeed for StaticFeed {
    fn current(&self) -> String {
        self.0.clone()
    }
}

/// Feed that other parts of the program can update while the filter runs.
#[derive(Clone, Debug, Default)]
pub struct SharedFeed(Arc<RwLock<String>>);

impl SharedFeed {
    /// Create a feed with an initial value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Replace the feed's value.
    pub fn set(&self, value: impl Into<String>) {
        *self.0.write() = value.into();
    }
}

impl TextFeed for SharedFeed {
    fn current(&self) -> String {
        self.0.read().clone()
    }
}

/// Expands dynamic placeholders in a line before it is rendered.
pub trait PlaceholderExpander: Send {
    /// Expand `template` for a frame at `timestamp_us` (microseconds since the epoch).
    fn expand(&self, template: &str, timestamp_us: u64) -> String;
}

/// Default expander.
///
/// - `$name$` is replaced by the current value of feed `name`; unknown names stay verbatim.
/// - `%H %M %S %Y %m %d` format the frame timestamp (UTC), `%ts` is the raw timestamp,
///   `%%` is a literal `%`. Any other `%` sequence stays verbatim.
#[derive(Clone, Default)]
pub struct FeedExpander {
    feeds: BTreeMap<String, Arc<dyn TextFeed>>,
}

impl std::fmt::Debug for FeedExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedExpander")
            .field("feeds", &self.feeds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FeedExpander {
    /// Expander with no feeds bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `feed` under `name`.
    pub fn with_feed(mut self, name: impl Into<String>, feed: Arc<dyn TextFeed>) -> Self {
        self.feeds.insert(name.into(), feed);
        self
    }

    /// Bind a constant string under every key of `map`.
    pub fn with_static_feeds<'a>(mut self, map: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (name, value) in map {
            self.feeds
                .insert(name.clone(), Arc::new(StaticFeed(value.clone())));
        }
        self
    }

    fn expand_time(out: &mut String, code: char, timestamp_us: u64) -> bool {
        let nanos = i128::from(timestamp_us) * 1_000;
        let Ok(t) = time::OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
            return false;
        };
        let s = match code {
            'H' => format!("{:02}", t.hour()),
            'M' => format!("{:02}", t.minute()),
            'S' => format!("{:02}", t.second()),
            'Y' => format!("{:04}", t.year()),
            'm' => format!("{:02}", u8::from(t.month())),
            'd' => format!("{:02}", t.day()),
            _ => return false,
        };
        out.push_str(&s);
        true
    }
}

impl PlaceholderExpander for FeedExpander {
    fn expand(&self, template: &str, timestamp_us: u64) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(i) = rest.find(['%', '$']) {
            out.push_str(&rest[..i]);
            let tail = &rest[i..];

            if let Some(after) = tail.strip_prefix('$') {
                match after.find('$') {
                    Some(end) => {
                        let name = &after[..end];
                        match self.feeds.get(name) {
                            Some(feed) => {
                                out.push_str(&feed.current());
                                rest = &after[end + 1..];
                            }
                            // The closing `$` may open the next placeholder.
                            None => {
                                out.push('$');
                                rest = after;
                            }
                        }
                    }
                    None => {
                        out.push_str(tail);
                        rest = "";
                    }
                }
                continue;
            }

            let after = &tail[1..];
            if let Some(r) = after.strip_prefix("ts") {
                out.push_str(&timestamp_us.to_string());
                rest = r;
            } else if let Some(r) = after.strip_prefix('%') {
                out.push('%');
                rest = r;
            } else {
                match after.chars().next() {
                    Some(c) if Self::expand_time(&mut out, c, timestamp_us) => {
                        rest = &after[c.len_utf8()..];
                    }
                    _ => {
                        out.push('%');
                        rest = after;
                    }
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Split expanded text into display lines.
///
/// Real newlines win; text without any is split on the two-character `\n` escape.
pub fn split_display_lines(text: &str) -> Vec<&str> {
    if text.contains('\n') {
        text.split('\n').collect()
    } else {
        text.split("\\n").collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/expand.rs"]
mod tests;
