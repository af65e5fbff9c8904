//! Text templates for plain log lines
//!
//! A template mixes literal text, `{field[:spec]}` placeholders and colour
//! markup, e.g.
//!
//! ```text
//! [<c>{time:YYYY-MM-DD HH:mm:ss.SSS Z}</c> | <level>{level_short:<5}</level> | <w>{name}:{line}</w>]: <level>{message}</level>
//! ```
//!
//! Templates are compiled once when a sink is registered, so an unknown
//! field is reported there and never during dispatch. Markup is turned
//! into ANSI styles when colourizing and dropped otherwise.

use super::error::{LoggerError, Result};
use super::record::LogRecord;
use super::timestamp::{format_elapsed, TimePattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spec {
    align: Align,
    width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Time(TimePattern),
    Level,
    LevelNo,
    LevelIcon,
    LevelShort,
    Name,
    Module,
    Function,
    File,
    FilePath,
    Line,
    Message,
    Process,
    ProcessName,
    Thread,
    ThreadName,
    Elapsed,
    Extra,
    ExtraKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorName {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    /// Colour of the record's level
    Level,
    Fg(ColorName, bool),
    Bg(ColorName, bool),
    Bold,
    Dim,
    Normal,
    Italic,
    Underline,
    Strike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field, Option<Spec>),
    Open(Style),
    Close,
}

/// Compiled text template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(c) = rest.chars().next() {
            match c {
                '{' if rest.starts_with("{{") => {
                    literal.push('{');
                    rest = &rest[2..];
                }
                '}' if rest.starts_with("}}") => {
                    literal.push('}');
                    rest = &rest[2..];
                }
                '{' => {
                    let end = rest.find('}').ok_or_else(|| {
                        LoggerError::config("template", format!("unclosed '{{' in \"{}\"", source))
                    })?;
                    flush(&mut literal, &mut segments);
                    let (field, spec) = parse_placeholder(&rest[1..end])?;
                    segments.push(Segment::Field(field, spec));
                    rest = &rest[end + 1..];
                }
                '\\' if rest[1..].starts_with('<') => {
                    literal.push('<');
                    rest = &rest[2..];
                }
                '<' => match parse_tag(rest) {
                    Some((segment, len)) => {
                        flush(&mut literal, &mut segments);
                        segments.push(segment);
                        rest = &rest[len..];
                    }
                    None => {
                        literal.push('<');
                        rest = &rest[1..];
                    }
                },
                _ => {
                    literal.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        flush(&mut literal, &mut segments);

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render a record; markup becomes ANSI styles only when `colorize`
    pub fn render(&self, record: &LogRecord, colorize: bool) -> String {
        let mut out = String::new();
        let mut styles: Vec<Style> = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => push_styled(&mut out, text, &styles, record, colorize),
                Segment::Field(field, spec) => {
                    let value = render_field(field, record);
                    let value = match spec {
                        Some(spec) => pad(&value, *spec),
                        None => value,
                    };
                    push_styled(&mut out, &value, &styles, record, colorize);
                }
                Segment::Open(style) => styles.push(*style),
                Segment::Close => {
                    styles.pop();
                }
            }
        }
        out
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn parse_placeholder(body: &str) -> Result<(Field, Option<Spec>)> {
    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec)),
        None => (body.trim(), None),
    };

    // time takes its pattern as the spec
    if name == "time" {
        let pattern = match spec {
            Some(pattern) if !pattern.is_empty() => TimePattern::parse(pattern),
            _ => TimePattern::default(),
        };
        return Ok((Field::Time(pattern), None));
    }

    let field = match name {
        "level" | "level.name" => Field::Level,
        "level.no" => Field::LevelNo,
        "level.icon" => Field::LevelIcon,
        "level_short" => Field::LevelShort,
        "name" => Field::Name,
        "module" => Field::Module,
        "function" => Field::Function,
        "file" | "file.name" => Field::File,
        "file.path" => Field::FilePath,
        "line" => Field::Line,
        "message" => Field::Message,
        "process" | "process.id" => Field::Process,
        "process.name" => Field::ProcessName,
        "thread" | "thread.id" => Field::Thread,
        "thread.name" => Field::ThreadName,
        "elapsed" => Field::Elapsed,
        "extra" => Field::Extra,
        other => match other
            .strip_prefix("extra[")
            .and_then(|key| key.strip_suffix(']'))
        {
            Some(key) => Field::ExtraKey(key.trim_matches(|c| c == '"' || c == '\'').to_string()),
            None => {
                return Err(LoggerError::config(
                    "template",
                    format!("unknown field '{{{}}}'", other),
                ))
            }
        },
    };

    let spec = spec.map(parse_spec).transpose()?;
    Ok((field, spec))
}

fn parse_spec(spec: &str) -> Result<Spec> {
    let (align, width) = match spec.chars().next() {
        Some('<') => (Align::Left, &spec[1..]),
        Some('>') => (Align::Right, &spec[1..]),
        Some('^') => (Align::Center, &spec[1..]),
        _ => (Align::Left, spec),
    };
    let width = width
        .parse()
        .map_err(|_| LoggerError::config("template", format!("invalid format spec ':{}'", spec)))?;
    Ok(Spec { align, width })
}

fn pad(value: &str, spec: Spec) -> String {
    let width = spec.width;
    match spec.align {
        Align::Left => format!("{:<width$}", value),
        Align::Right => format!("{:>width$}", value),
        Align::Center => format!("{:^width$}", value),
    }
}

fn color_name(name: &str) -> Option<ColorName> {
    Some(match name {
        "k" | "black" => ColorName::Black,
        "r" | "red" => ColorName::Red,
        "g" | "green" => ColorName::Green,
        "y" | "yellow" => ColorName::Yellow,
        "e" | "blue" => ColorName::Blue,
        "m" | "magenta" => ColorName::Magenta,
        "c" | "cyan" => ColorName::Cyan,
        "w" | "white" => ColorName::White,
        _ => return None,
    })
}

fn parse_style(name: &str) -> Option<Style> {
    let style = match name {
        "level" | "lvl" => Style::Level,
        "b" | "bold" => Style::Bold,
        "d" | "dim" => Style::Dim,
        "n" | "normal" => Style::Normal,
        "i" | "italic" => Style::Italic,
        "u" | "underline" => Style::Underline,
        "s" | "strike" => Style::Strike,
        _ => {
            if let Some(color) = name.strip_prefix("light-").and_then(color_name) {
                return Some(Style::Fg(color, true));
            }
            if let Some(color) = color_name(name) {
                return Some(Style::Fg(color, false));
            }
            // upper-case single letters are backgrounds, e.g. <R>
            if name.len() == 1 && name.chars().all(|c| c.is_ascii_uppercase()) {
                return color_name(&name.to_ascii_lowercase()).map(|c| Style::Bg(c, false));
            }
            return None;
        }
    };
    Some(style)
}

/// Parse `<tag>`, `</tag>` or `</>` at the start of `input`
fn parse_tag(input: &str) -> Option<(Segment, usize)> {
    let end = input.find('>')?;
    let inner = &input[1..end];
    if let Some(closing) = inner.strip_prefix('/') {
        if closing.is_empty() || parse_style(closing).is_some() {
            return Some((Segment::Close, end + 1));
        }
        return None;
    }
    parse_style(inner).map(|style| (Segment::Open(style), end + 1))
}

fn render_field(field: &Field, record: &LogRecord) -> String {
    let location = record.location();
    match field {
        Field::Time(pattern) => pattern.render(record.time()),
        Field::Level => record.level().to_str().to_string(),
        Field::LevelNo => record.level().no().to_string(),
        Field::LevelIcon => record.level().icon().to_string(),
        Field::LevelShort => record.level().short_name().to_string(),
        Field::Name => record.name().to_string(),
        Field::Module => location.module_name().to_string(),
        Field::Function => location.function.clone().unwrap_or_default(),
        Field::File => location.file_name().to_string(),
        Field::FilePath => location.file.clone(),
        Field::Line => location.line.to_string(),
        Field::Message => record.message().to_string(),
        Field::Process => record.process().id.to_string(),
        Field::ProcessName => record.process().name.clone(),
        Field::Thread => record.thread().id.to_string(),
        Field::ThreadName => record.thread().name.clone(),
        Field::Elapsed => format_elapsed(record.elapsed()),
        Field::Extra => {
            let mut lossy = Vec::new();
            record.extra().to_json_lossy(&mut lossy).to_string()
        }
        Field::ExtraKey(key) => record
            .extra()
            .get(key)
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

#[cfg(feature = "console")]
fn push_styled(out: &mut String, text: &str, styles: &[Style], record: &LogRecord, colorize: bool) {
    use colored::{Color, Colorize};
    use std::fmt::Write as _;

    if !colorize || styles.is_empty() || text.is_empty() {
        out.push_str(text);
        return;
    }

    fn to_color(name: ColorName, bright: bool) -> Color {
        match (name, bright) {
            (ColorName::Black, false) => Color::Black,
            (ColorName::Red, false) => Color::Red,
            (ColorName::Green, false) => Color::Green,
            (ColorName::Yellow, false) => Color::Yellow,
            (ColorName::Blue, false) => Color::Blue,
            (ColorName::Magenta, false) => Color::Magenta,
            (ColorName::Cyan, false) => Color::Cyan,
            (ColorName::White, false) => Color::White,
            (ColorName::Black, true) => Color::BrightBlack,
            (ColorName::Red, true) => Color::BrightRed,
            (ColorName::Green, true) => Color::BrightGreen,
            (ColorName::Yellow, true) => Color::BrightYellow,
            (ColorName::Blue, true) => Color::BrightBlue,
            (ColorName::Magenta, true) => Color::BrightMagenta,
            (ColorName::Cyan, true) => Color::BrightCyan,
            (ColorName::White, true) => Color::BrightWhite,
        }
    }

    let mut styled = text.normal();
    for style in styles {
        styled = match *style {
            Style::Level => {
                let styled = styled.color(record.level().color_code());
                if record.level() >= super::log_level::LogLevel::Success {
                    styled.bold()
                } else {
                    styled
                }
            }
            Style::Fg(name, bright) => styled.color(to_color(name, bright)),
            Style::Bg(name, bright) => styled.on_color(to_color(name, bright)),
            Style::Bold => styled.bold(),
            Style::Dim => styled.dimmed(),
            Style::Normal => styled.clear(),
            Style::Italic => styled.italic(),
            Style::Underline => styled.underline(),
            Style::Strike => styled.strikethrough(),
        };
    }
    let _ = write!(out, "{}", styled);
}

#[cfg(not(feature = "console"))]
fn push_styled(out: &mut String, text: &str, _styles: &[Style], _record: &LogRecord, _colorize: bool) {
    out.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extra::Extra;
    use crate::core::log_level::LogLevel;
    use crate::core::record::Location;

    const FILE_FORMAT: &str =
        "[{time:YYYY-MM-DD HH:mm:ss.SSS Z} | {level_short:<5} | {name}:{line}]: {message}";
    const STREAM_FORMAT: &str = "[<c>{time:YYYY-MM-DD HH:mm:ss.SSS Z}</c> | <level>{level_short:<5}</level> | <w>{name}:{line}</w>]: <level>{message}</level>";

    fn record() -> LogRecord {
        LogRecord::new(LogLevel::Warning, "disk almost full")
            .with_location(Location::new("src/storage/disk.rs", 88, "app::storage"))
            .with_extra(Extra::new().with_field("request_id", "abc"))
    }

    #[test]
    fn test_file_format_line() {
        let record = record();
        let template = Template::compile(FILE_FORMAT).unwrap();
        let line = template.render(&record, false);

        let time = record.time().format("%Y-%m-%d %H:%M:%S%.3f %:z").to_string();
        assert_eq!(
            line,
            format!("[{} | WARN  | app::storage:88]: disk almost full", time)
        );
    }

    #[test]
    fn test_markup_stripped_without_color() {
        let template = Template::compile(STREAM_FORMAT).unwrap();
        let line = template.render(&record(), false);

        assert!(!line.contains('<'));
        assert!(!line.contains('\x1b'));
        assert!(line.ends_with("| WARN  | app::storage:88]: disk almost full"));
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_markup_colorized() {
        colored::control::set_override(true);
        let template = Template::compile("<red>{message}</red>").unwrap();
        let line = template.render(&record(), true);
        assert!(line.contains("\x1b["));
        assert!(line.contains("disk almost full"));
    }

    #[test]
    fn test_fields_and_alignment() {
        let template =
            Template::compile("{level:>8}|{level.no}|{file}|{module}|{extra[request_id]}|{extra[missing]}|")
                .unwrap();
        assert_eq!(
            template.render(&record(), false),
            " WARNING|30|disk.rs|storage|abc||"
        );
    }

    #[test]
    fn test_escapes_and_unknown_tags() {
        let template = Template::compile("{{literal}} <notatag> \\<b> {message}").unwrap();
        assert_eq!(
            template.render(&record(), false),
            "{literal} <notatag> <b> disk almost full"
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Template::compile("{lvl}").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(Template::compile("{message").is_err());
        assert!(Template::compile("{level:<x}").is_err());
    }

    #[test]
    fn test_icon_field() {
        let template = Template::compile("{level.icon}").unwrap();
        assert_eq!(template.render(&record(), false), LogLevel::Warning.icon());
    }
}
