//! Deep-inspection formatter for shadow values.
//!
//! Output follows the conventions of Node's `util.inspect` so reporters and
//! console output look the same as for an in-process run:
//!
//! ```text
//! [ <1 empty item>, 42, test: 7 ]
//! Map(1) { 'a' => [Function: f] }
//! { a: { b: { c: [Object] } } }
//! ```
//!
//! Entries of the innermost three levels stay on one line while they fit into
//! `break_length`; longer arrays are grouped into aligned columns.

use crate::shadow::{
    ArrayShadow, ErrorShadow, InspectHook, PromiseShadow, Properties, Shadow, Synthetic,
};
use crate::shadow::js_number;
use console::Style;

/// Style classes used when colors are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    /// Functions, classes, `<pending>` and other markers
    Special,
    /// Numbers
    Number,
    /// BigInts
    BigInt,
    /// Booleans
    Boolean,
    /// `undefined` and empty-item markers
    Undefined,
    /// `null`
    Null,
    /// Strings
    String,
    /// Symbols
    Symbol,
    /// Dates
    Date,
    /// Regular expressions
    RegExp,
    /// Property names (never colored)
    Name,
}

impl StyleKind {
    fn style(self) -> Option<Style> {
        let style = Style::new();
        Some(match self {
            Self::Special => style.cyan(),
            Self::Number | Self::BigInt | Self::Boolean => style.yellow(),
            Self::Undefined => style.black().bright(),
            Self::Null => style.bold(),
            Self::String | Self::Symbol => style.green(),
            Self::Date => style.magenta(),
            Self::RegExp => style.red(),
            Self::Name => return None,
        })
    }
}

/// Inspection options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Nesting levels to descend before abbreviating; `None` for unlimited
    pub depth: Option<usize>,
    /// Emit ANSI colors
    pub colors: bool,
    /// Line width used to decide between single and multi-line output
    pub break_length: usize,
    /// Number of innermost levels combined on a single line
    pub compact: usize,
    /// Maximum number of array, set and map entries shown
    pub max_array_length: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: Some(2),
            colors: false,
            break_length: 80,
            compact: 3,
            max_array_length: 100,
        }
    }
}

impl InspectOptions {
    /// Set the depth limit
    #[must_use]
    pub const fn with_depth(mut self, depth: Option<usize>) -> Self {
        self.depth = depth;
        self
    }

    /// Enable or disable colors
    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Set the break length
    #[must_use]
    pub const fn with_break_length(mut self, break_length: usize) -> Self {
        self.break_length = break_length;
        self
    }
}

/// Render `value` the way Node's `util.inspect` would
#[must_use]
pub fn inspect(value: &Shadow, options: &InspectOptions) -> String {
    Inspector::new(options).format_value(value, 0)
}

/// Format console arguments, honouring printf-style specifiers in a leading string
#[must_use]
pub fn format_console(args: &[Shadow], options: &InspectOptions) -> String {
    let mut out = String::new();
    let mut rest = args;
    if let Some((Shadow::String(template), tail)) = args.split_first() {
        rest = tail;
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let Some(&spec) = chars.peek() else {
                out.push('%');
                break;
            };
            if spec == '%' {
                chars.next();
                out.push('%');
                continue;
            }
            if !"sdifjoOc".contains(spec) {
                out.push('%');
                continue;
            }
            chars.next();
            let Some((arg, tail)) = rest.split_first() else {
                out.push('%');
                out.push(spec);
                continue;
            };
            rest = tail;
            out.push_str(&format_specifier(spec, arg, options));
        }
    }
    for (index, arg) in rest.iter().enumerate() {
        if index > 0 || !out.is_empty() || args.len() > rest.len() {
            out.push(' ');
        }
        match arg {
            Shadow::String(s) => out.push_str(s),
            other => out.push_str(&inspect(other, options)),
        }
    }
    out
}

fn format_specifier(spec: char, arg: &Shadow, options: &InspectOptions) -> String {
    match spec {
        's' => match arg {
            Shadow::Number(n) => format_number(*n),
            Shadow::BigInt(n) => format!("{n}n"),
            Shadow::Undefined
            | Shadow::Null
            | Shadow::Bool(_)
            | Shadow::String(_)
            | Shadow::Symbol(_)
            | Shadow::Function { .. }
            | Shadow::Class { .. }
            | Shadow::Synthetic(_) => arg.to_js_string(),
            other => inspect(
                other,
                &InspectOptions {
                    depth: Some(0),
                    colors: false,
                    ..options.clone()
                },
            ),
        },
        'd' => match arg {
            Shadow::BigInt(n) => format!("{n}n"),
            other => format_number(to_number(other)),
        },
        'i' => match arg {
            Shadow::BigInt(n) => format!("{n}n"),
            Shadow::Number(n) if n.is_finite() => format_number(n.trunc()),
            other => format_number(parse_leading(&other.to_js_string(), true)),
        },
        'f' => match arg {
            Shadow::Symbol(_) => "NaN".to_string(),
            Shadow::Number(n) => format_number(*n),
            other => format_number(parse_leading(&other.to_js_string(), false)),
        },
        'j' => arg
            .to_json()
            .map_or_else(|| "undefined".to_string(), |json| json.to_string()),
        'o' => inspect(
            arg,
            &InspectOptions {
                depth: Some(4),
                ..options.clone()
            },
        ),
        'O' => inspect(arg, options),
        _ => String::new(),
    }
}

/// JavaScript `Number(value)`
fn to_number(value: &Shadow) -> f64 {
    match value {
        Shadow::Number(n) => *n,
        Shadow::Null => 0.0,
        Shadow::Bool(b) => f64::from(u8::from(*b)),
        Shadow::String(s) => {
            let s = s.trim();
            match s {
                "" => 0.0,
                "Infinity" | "+Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                _ if s.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) => {
                    s.parse().unwrap_or(f64::NAN)
                }
                _ => f64::NAN,
            }
        }
        Shadow::Date(millis) => *millis,
        _ => f64::NAN,
    }
}

/// `parseInt` / `parseFloat` on the longest numeric prefix
fn parse_leading(text: &str, integer: bool) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = integer;
    for (index, c) in text.char_indices() {
        match c {
            '+' | '-' if index == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = index + c.len_utf8();
    }
    if !seen_digit {
        return f64::NAN;
    }
    text[..end].trim_end_matches('.').parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        js_number(n)
    }
}

/// Keys printed without quotes: `^[a-zA-Z_][a-zA-Z_0-9]*$`
fn is_identifier_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote and escape a string the way Node does
fn quote(text: &str) -> String {
    let quote = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else if !text.contains('`') && !text.contains("${") {
        '`'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn visible_width(text: &str) -> usize {
    console::strip_ansi_codes(text).chars().count()
}

struct Inspector<'a> {
    options: &'a InspectOptions,
    indentation: usize,
    current_depth: usize,
    hook_depth: usize,
}

impl<'a> Inspector<'a> {
    const fn new(options: &'a InspectOptions) -> Self {
        Self {
            options,
            indentation: 0,
            current_depth: 0,
            hook_depth: 0,
        }
    }

    fn stylize(&self, text: &str, kind: StyleKind) -> String {
        if !self.options.colors {
            return text.to_string();
        }
        match kind.style() {
            Some(style) => style.force_styling(true).apply_to(text).to_string(),
            None => text.to_string(),
        }
    }

    fn format_value(&mut self, value: &Shadow, recurse_times: usize) -> String {
        match value {
            Shadow::Undefined => self.stylize("undefined", StyleKind::Undefined),
            Shadow::Null => self.stylize("null", StyleKind::Null),
            Shadow::Bool(b) => self.stylize(&b.to_string(), StyleKind::Boolean),
            Shadow::Number(n) => self.stylize(&format_number(*n), StyleKind::Number),
            Shadow::BigInt(n) => self.stylize(&format!("{n}n"), StyleKind::BigInt),
            Shadow::String(s) => self.format_string(s),
            Shadow::Symbol(symbol) => self.stylize(&symbol.to_string(), StyleKind::Symbol),
            Shadow::Raw(raw) => self.format_value(&Shadow::from_json(raw), recurse_times),
            Shadow::Synthetic(node) => {
                self.hook_depth = recurse_times;
                node.pretty(self)
            }
            other => self.format_raw(other, recurse_times),
        }
    }

    fn format_string(&self, text: &str) -> String {
        const MIN_LINE_WIDTH: usize = 16;
        let length = text.chars().count();
        let limit = self
            .options
            .break_length
            .saturating_sub(self.indentation)
            .saturating_sub(4);
        if length > MIN_LINE_WIDTH && length > limit && text.contains('\n') {
            let joiner = format!(" +\n{}", " ".repeat(self.indentation + 2));
            return text
                .split_inclusive('\n')
                .map(|line| self.stylize(&quote(line), StyleKind::String))
                .collect::<Vec<_>>()
                .join(&joiner);
        }
        self.stylize(&quote(text), StyleKind::String)
    }

    fn format_raw(&mut self, value: &Shadow, recurse_times: usize) -> String {
        let mut base = String::new();
        let braces: (String, String);
        let mut array_like = false;
        let mut numeric = false;
        let mut props: Option<&Properties> = None;
        let ctx_name: String;

        match value {
            Shadow::Array(array) => {
                if array.is_empty() && array.extra.is_empty() {
                    return "[]".to_string();
                }
                braces = ("[".into(), "]".into());
                array_like = true;
                numeric = array.is_dense()
                    && array
                        .elements
                        .values()
                        .all(|item| matches!(item, Shadow::Number(_) | Shadow::BigInt(_)));
                props = Some(&array.extra);
                ctx_name = "Array".into();
            }
            Shadow::TypedArray { kind, values } => {
                let prefix = format!("{}({})", kind.name(), values.len());
                if values.is_empty() {
                    return format!("{prefix} []");
                }
                braces = (format!("{prefix} ["), "]".into());
                array_like = true;
                numeric = true;
                ctx_name = kind.name().into();
            }
            Shadow::Set(items) => {
                if items.is_empty() {
                    return "Set(0) {}".to_string();
                }
                braces = (format!("Set({}) {{", items.len()), "}".into());
                ctx_name = "Set".into();
            }
            Shadow::Map(entries) => {
                if entries.is_empty() {
                    return "Map(0) {}".to_string();
                }
                braces = (format!("Map({}) {{", entries.len()), "}".into());
                ctx_name = "Map".into();
            }
            Shadow::Object(object) => {
                if object.is_empty() {
                    return "{}".to_string();
                }
                braces = ("{".into(), "}".into());
                props = Some(object);
                ctx_name = "Object".into();
            }
            Shadow::Function {
                flavor,
                name,
                props: own,
            } => {
                let label = if name.is_empty() {
                    format!("[{} (anonymous)]", flavor.name())
                } else {
                    format!("[{}: {name}]", flavor.name())
                };
                base = self.stylize(&label, StyleKind::Special);
                if own.is_empty() {
                    return base;
                }
                braces = ("{".into(), "}".into());
                props = Some(own);
                ctx_name = "Function".into();
            }
            Shadow::Class { name, base: parent } => {
                let name = if name.is_empty() { "(anonymous)" } else { name };
                let label = match parent {
                    Some(parent) if !parent.is_empty() => format!("[class {name} extends {parent}]"),
                    _ => format!("[class {name}]"),
                };
                return self.stylize(&label, StyleKind::Special);
            }
            Shadow::RegExp { source, flags } => {
                return self.stylize(&format!("/{source}/{flags}"), StyleKind::RegExp);
            }
            Shadow::Date(millis) => {
                let text = crate::shadow::iso_date(*millis).unwrap_or_else(|| "Invalid Date".into());
                return self.stylize(&text, StyleKind::Date);
            }
            Shadow::Error(error) => {
                base = self.format_error(error);
                let visible = visible_error_props(error);
                if visible.is_empty() {
                    return base;
                }
                braces = ("{".into(), "}".into());
                ctx_name = error.name();
                return self.format_entries(
                    &base,
                    &braces,
                    &ctx_name,
                    recurse_times,
                    |inspector, times| {
                        let mut output = Vec::new();
                        inspector.push_properties(&mut output, &visible, times);
                        output
                    },
                    false,
                    false,
                );
            }
            Shadow::WeakSet | Shadow::WeakMap => {
                let name = value.to_string_tag();
                if self.exceeds_depth(recurse_times) {
                    return self.stylize(&format!("[{name}]"), StyleKind::Special);
                }
                let marker = self.stylize("<items unknown>", StyleKind::Special);
                return format!("{name} {{ {marker} }}");
            }
            Shadow::WeakRef => {
                if self.exceeds_depth(recurse_times) {
                    return self.stylize("[WeakRef]", StyleKind::Special);
                }
                return "WeakRef { {} }".to_string();
            }
            Shadow::Promise(_) => {
                braces = ("Promise {".into(), "}".into());
                ctx_name = "Promise".into();
            }
            _ => return value.to_js_string(),
        }

        self.format_entries(
            &base,
            &braces,
            &ctx_name,
            recurse_times,
            |inspector, times| {
                let mut output = match value {
                    Shadow::Array(array) => inspector.format_array(array, times),
                    Shadow::TypedArray { values, .. } => inspector.format_typed_array(values),
                    Shadow::Set(items) => inspector.format_set(items, times),
                    Shadow::Map(entries) => inspector.format_map(entries, times),
                    Shadow::Promise(state) => inspector.format_promise(state, times),
                    _ => Vec::new(),
                };
                if let Some(props) = props {
                    inspector.push_properties(&mut output, props, times);
                }
                output
            },
            array_like,
            numeric,
        )
    }

    fn exceeds_depth(&self, recurse_times: usize) -> bool {
        self.options.depth.is_some_and(|depth| recurse_times > depth)
    }

    fn format_entries(
        &mut self,
        base: &str,
        braces: &(String, String),
        ctx_name: &str,
        recurse_times: usize,
        entries: impl FnOnce(&mut Self, usize) -> Vec<String>,
        array_like: bool,
        numeric: bool,
    ) -> String {
        if self.exceeds_depth(recurse_times) {
            return self.stylize(&format!("[{ctx_name}]"), StyleKind::Special);
        }
        let recurse_times = recurse_times + 1;
        self.current_depth = recurse_times;
        let output = entries(self, recurse_times);
        self.reduce_to_single_string(output, base, braces, array_like, numeric, recurse_times)
    }

    fn format_error(&self, error: &ErrorShadow) -> String {
        let mut stack = match &error.stack {
            Some(stack) if !stack.is_empty() => stack.clone(),
            _ => error.summary(),
        };
        if !stack.contains("\n    at") {
            stack = format!("[{stack}]");
        }
        if self.indentation != 0 {
            let indentation = " ".repeat(self.indentation);
            stack = stack.replace('\n', &format!("\n{indentation}"));
        }
        stack
    }

    fn format_array(&mut self, array: &ArrayShadow, recurse_times: usize) -> Vec<String> {
        let limit = self.options.max_array_length;
        let mut output = Vec::new();
        let mut cursor: u32 = 0;
        let mut elements = array.elements.iter().peekable();
        while cursor < array.length && output.len() < limit {
            match elements.peek() {
                Some(&(&index, item)) if index == cursor => {
                    output.push(self.format_element(item, recurse_times));
                    elements.next();
                    cursor += 1;
                }
                next => {
                    let end = next.map_or(array.length, |&(&index, _)| index);
                    let holes = end - cursor;
                    let label = format!("<{holes} empty item{}>", if holes > 1 { "s" } else { "" });
                    output.push(self.stylize(&label, StyleKind::Undefined));
                    cursor = end;
                }
            }
        }
        let remaining = (array.length - cursor) as usize;
        if remaining > 0 {
            output.push(more_items(remaining));
        }
        output
    }

    fn format_typed_array(&self, values: &[f64]) -> Vec<String> {
        let shown = values.len().min(self.options.max_array_length);
        let mut output: Vec<String> = values[..shown]
            .iter()
            .map(|n| self.stylize(&format_number(*n), StyleKind::Number))
            .collect();
        if values.len() > shown {
            output.push(more_items(values.len() - shown));
        }
        output
    }

    fn format_element(&mut self, value: &Shadow, recurse_times: usize) -> String {
        self.indentation += 2;
        let out = self.format_value(value, recurse_times);
        self.indentation -= 2;
        out
    }

    fn format_set(&mut self, items: &[Shadow], recurse_times: usize) -> Vec<String> {
        self.indentation += 2;
        let output = items
            .iter()
            .map(|item| self.format_value(item, recurse_times))
            .collect();
        self.indentation -= 2;
        output
    }

    fn format_map(&mut self, entries: &[(Shadow, Shadow)], recurse_times: usize) -> Vec<String> {
        self.indentation += 2;
        let output = entries
            .iter()
            .map(|(key, value)| {
                let key = self.format_value(key, recurse_times);
                let value = self.format_value(value, recurse_times);
                format!("{key} => {value}")
            })
            .collect();
        self.indentation -= 2;
        output
    }

    fn format_promise(&mut self, state: &PromiseShadow, recurse_times: usize) -> Vec<String> {
        match state {
            PromiseShadow::Pending => vec![self.stylize("<pending>", StyleKind::Special)],
            PromiseShadow::Fulfilled(value) => vec![self.format_element(value, recurse_times)],
            PromiseShadow::Rejected(reason) => {
                let marker = self.stylize("<rejected>", StyleKind::Special);
                let reason = self.format_element(reason, recurse_times);
                vec![format!("{marker} {reason}")]
            }
        }
    }

    fn push_properties(&mut self, output: &mut Vec<String>, props: &Properties, recurse_times: usize) {
        for (key, value) in &props.keys {
            let name = if is_identifier_key(key) {
                self.stylize(key, StyleKind::Name)
            } else {
                self.stylize(&quote(key), StyleKind::String)
            };
            let value = self.format_element(value, recurse_times);
            output.push(format!("{name}: {value}"));
        }
        for (symbol, value) in &props.symbols {
            let name = self.stylize(&symbol.to_string(), StyleKind::Symbol);
            let value = self.format_element(value, recurse_times);
            output.push(format!("[{name}]: {value}"));
        }
    }

    fn is_below_break_length(&self, output: &[String], start: usize, base: &str) -> bool {
        let mut total = output.len() + start;
        if total + output.len() > self.options.break_length {
            return false;
        }
        for entry in output {
            total += visible_width(entry);
            if total > self.options.break_length {
                return false;
            }
        }
        base.is_empty() || !base.contains('\n')
    }

    fn reduce_to_single_string(
        &self,
        output: Vec<String>,
        base: &str,
        braces: &(String, String),
        array_like: bool,
        numeric: bool,
        recurse_times: usize,
    ) -> String {
        let entries = output.len();
        let output = if array_like && entries > 6 {
            self.group_array_elements(output, numeric)
        } else {
            output
        };
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("{base} ")
        };
        if self.current_depth.saturating_sub(recurse_times) < self.options.compact
            && entries == output.len()
        {
            let start = output.len() + self.indentation + braces.0.len() + base.len() + 10;
            if self.is_below_break_length(&output, start, base) {
                let joined = output.join(", ");
                if !joined.contains('\n') {
                    return format!("{prefix}{} {joined} {}", braces.0, braces.1);
                }
            }
        }
        let indentation = format!("\n{}", " ".repeat(self.indentation));
        format!(
            "{prefix}{}{indentation}  {}{indentation}{}",
            braces.0,
            output.join(&format!(",{indentation}  ")),
            braces.1
        )
    }

    fn group_array_elements(&self, output: Vec<String>, numeric: bool) -> Vec<String> {
        const SEPARATOR_SPACE: usize = 2;
        let mut output_length = output.len();
        if output.last().is_some_and(|last| last.starts_with("... ")) {
            output_length -= 1;
        }
        let data_len: Vec<usize> = output[..output_length]
            .iter()
            .map(|entry| visible_width(entry))
            .collect();
        let total_length: usize = data_len.iter().map(|len| len + SEPARATOR_SPACE).sum();
        let max_length = data_len.iter().copied().max().unwrap_or(0);
        let actual_max = max_length + SEPARATOR_SPACE;
        let break_length = self.options.break_length;

        if actual_max * 3 + self.indentation >= break_length
            || !(total_length as f64 / actual_max as f64 > 5.0 || max_length <= 6)
        {
            return output;
        }

        let average_bias = (actual_max as f64 - total_length as f64 / output.len() as f64).sqrt();
        let biased_max = (actual_max as f64 - 3.0 - average_bias).max(1.0);
        let columns = ((2.5 * biased_max * output_length as f64).sqrt() / biased_max)
            .round()
            .min(((break_length - self.indentation) / actual_max) as f64)
            .min((self.options.compact * 4) as f64)
            .min(15.0) as usize;
        if columns <= 1 {
            return output;
        }

        let max_line_length: Vec<usize> = (0..columns)
            .map(|column| {
                (column..output_length)
                    .step_by(columns)
                    .map(|j| data_len[j])
                    .max()
                    .unwrap_or(0)
                    + SEPARATOR_SPACE
            })
            .collect();

        let mut grouped = Vec::new();
        let mut row = 0;
        while row < output_length {
            let end = (row + columns).min(output_length);
            let mut line = String::new();
            for j in row..end - 1 {
                let cell = format!("{}, ", output[j]);
                let padding = max_line_length[j - row] + output[j].chars().count() - data_len[j];
                line.push_str(&pad(&cell, padding, numeric));
            }
            let last = end - 1;
            if numeric {
                let padding = max_line_length[last - row] + output[last].chars().count()
                    - data_len[last]
                    - SEPARATOR_SPACE;
                line.push_str(&pad(&output[last], padding, true));
            } else {
                line.push_str(&output[last]);
            }
            grouped.push(line);
            row += columns;
        }
        if output_length < output.len() {
            grouped.push(output[output_length].clone());
        }
        grouped
    }
}

fn pad(text: &str, width: usize, start: bool) -> String {
    if start {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}

fn more_items(remaining: usize) -> String {
    format!("... {remaining} more item{}", if remaining > 1 { "s" } else { "" })
}

/// Error properties worth showing next to the stack
fn visible_error_props(error: &ErrorShadow) -> Properties {
    let stack = error.stack.clone().unwrap_or_default();
    let mut visible = error.props.clone();
    visible.keys.retain(|(key, value)| match (key.as_str(), value) {
        ("name" | "message", Shadow::String(text)) => !stack.contains(text.as_str()),
        ("stack", _) => false,
        _ => true,
    });
    visible
}

impl InspectHook for Inspector<'_> {
    fn stylize(&self, text: &str, kind: StyleKind) -> String {
        Inspector::stylize(self, text, kind)
    }

    fn inspect(&mut self, value: &Shadow) -> String {
        let depth = self.hook_depth;
        let out = self.format_value(value, depth);
        self.hook_depth = depth;
        out
    }
}

/// Inspect a synthetic node on its own
#[must_use]
pub fn inspect_synthetic(node: &Synthetic, options: &InspectOptions) -> String {
    Inspector::new(options).format_value(&Shadow::Synthetic(node.clone()), 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::encoding::{ErrorKind, FunctionFlavor, NodeListKind, TypedArrayKind};
    use crate::shadow::{Attr, Symbol};
    use num_bigint::BigInt;

    fn plain(value: &Shadow) -> String {
        inspect(value, &InspectOptions::default())
    }

    mod primitive_tests {
        use super::*;

        #[test]
        fn test_primitives() {
            assert_eq!(plain(&Shadow::Undefined), "undefined");
            assert_eq!(plain(&Shadow::Null), "null");
            assert_eq!(plain(&Shadow::Number(f64::NAN)), "NaN");
            assert_eq!(plain(&Shadow::Number(-0.0)), "-0");
            assert_eq!(plain(&Shadow::Number(42.0)), "42");
            assert_eq!(plain(&Shadow::BigInt(BigInt::from(1))), "1n");
            assert_eq!(plain(&Shadow::Symbol(Symbol::fresh(Some("x".into())))), "Symbol(x)");
            assert_eq!(plain(&Shadow::string("hi")), "'hi'");
        }

        #[test]
        fn test_string_quoting() {
            assert_eq!(quote("it's"), "\"it's\"");
            assert_eq!(quote("it's \"x\""), "`it's \"x\"`");
            assert_eq!(quote("a\nb"), "'a\\nb'");
            assert_eq!(quote("\u{1}"), "'\\x01'");
        }

        #[test]
        fn test_long_multiline_string_is_split() {
            let text = format!("{}\n{}", "a".repeat(50), "b".repeat(50));
            let out = plain(&Shadow::String(text));
            assert_eq!(out, format!("'{}\\n' +\n  '{}'", "a".repeat(50), "b".repeat(50)));
        }
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_primitive_array() {
            let value = Shadow::array([
                Shadow::Undefined,
                Shadow::Number(f64::NAN),
                Shadow::Number(42.0),
                Shadow::BigInt(BigInt::from(1)),
                Shadow::Symbol(Symbol::fresh(Some("x".into()))),
                Shadow::Number(f64::INFINITY),
                Shadow::Number(f64::NEG_INFINITY),
            ]);
            assert_eq!(
                plain(&value),
                "[\n  undefined, NaN,\n  42,        1n,\n  Symbol(x), Infinity,\n  -Infinity\n]"
            );
        }

        #[test]
        fn test_sparse_array_with_property() {
            let mut array = ArrayShadow::default();
            array.set(1, Shadow::Number(42.0));
            array.extra.insert("test", Shadow::Number(7.0));
            assert_eq!(plain(&Shadow::Array(array)), "[ <1 empty item>, 42, test: 7 ]");
        }

        #[test]
        fn test_far_sparse_index() {
            let mut array = ArrayShadow::default();
            array.set(3_000_000_000, Shadow::Number(1.0));
            assert_eq!(plain(&Shadow::Array(array)), "[ <3000000000 empty items>, 1 ]");
        }

        #[test]
        fn test_holes_count_toward_item_limit() {
            let mut array = ArrayShadow::default();
            for index in (0..400).step_by(2) {
                array.set(index, Shadow::Number(1.0));
            }
            let rendered = plain(&Shadow::Array(array));
            assert!(rendered.contains("... 299 more items"), "{rendered}");
        }

        #[test]
        fn test_numeric_grouping() {
            let value = Shadow::array((1..=7).map(|n| Shadow::Number(f64::from(n))));
            assert_eq!(plain(&value), "[\n  1, 2, 3, 4,\n  5, 6, 7\n]");
        }
    }

    mod object_tests {
        use super::*;

        #[test]
        fn test_nested_objects_and_depth() {
            let value = Shadow::object([(
                "a",
                Shadow::object([("b", Shadow::object([("c", Shadow::object([("d", Shadow::Number(1.0))]))]))]),
            )]);
            assert_eq!(plain(&value), "{ a: { b: { c: [Object] } } }");
            let unlimited = InspectOptions::default().with_depth(None);
            assert_eq!(inspect(&value, &unlimited), "{\n  a: { b: { c: { d: 1 } } }\n}");
        }

        #[test]
        fn test_quoted_and_symbol_keys() {
            let mut props = Properties::default();
            props.insert("a-b", Shadow::Number(1.0));
            props.symbols.push((Symbol::fresh(Some("s".into())), Shadow::Bool(true)));
            assert_eq!(plain(&Shadow::Object(props)), "{ 'a-b': 1, [Symbol(s)]: true }");
        }

        #[test]
        fn test_empty_containers() {
            assert_eq!(plain(&Shadow::object::<&str>([])), "{}");
            assert_eq!(plain(&Shadow::array([])), "[]");
            assert_eq!(plain(&Shadow::Set(Vec::new())), "Set(0) {}");
            assert_eq!(plain(&Shadow::Map(Vec::new())), "Map(0) {}");
        }

        #[test]
        fn test_long_object_breaks_lines() {
            let value = Shadow::object([
                ("first", Shadow::string("x".repeat(30))),
                ("second", Shadow::string("y".repeat(30))),
            ]);
            let out = plain(&value);
            assert!(out.starts_with("{\n  first: '"));
            assert!(out.ends_with("'\n}"));
        }
    }

    mod builtin_tests {
        use super::*;

        #[test]
        fn test_functions_and_classes() {
            let function = |flavor, name: &str| Shadow::Function {
                flavor,
                name: name.into(),
                props: Properties::default(),
            };
            assert_eq!(plain(&function(FunctionFlavor::Plain, "f")), "[Function: f]");
            assert_eq!(plain(&function(FunctionFlavor::Plain, "")), "[Function (anonymous)]");
            assert_eq!(plain(&function(FunctionFlavor::Async, "a")), "[AsyncFunction: a]");
            assert_eq!(
                plain(&function(FunctionFlavor::AsyncGenerator, "g")),
                "[AsyncGeneratorFunction: g]"
            );
            let class = Shadow::Class {
                name: "A".into(),
                base: Some("B".into()),
            };
            assert_eq!(plain(&class), "[class A extends B]");
            let anonymous = Shadow::Class {
                name: String::new(),
                base: None,
            };
            assert_eq!(plain(&anonymous), "[class (anonymous)]");
        }

        #[test]
        fn test_function_with_properties() {
            let mut props = Properties::default();
            props.insert("test", Shadow::Number(1.0));
            let function = Shadow::Function {
                flavor: FunctionFlavor::Plain,
                name: "f".into(),
                props,
            };
            assert_eq!(plain(&function), "[Function: f] { test: 1 }");
        }

        #[test]
        fn test_collections() {
            let set = Shadow::Set(vec![Shadow::Number(1.0), Shadow::Number(2.0)]);
            assert_eq!(plain(&set), "Set(2) { 1, 2 }");
            let map = Shadow::Map(vec![
                (Shadow::Number(1.0), Shadow::Number(2.0)),
                (Shadow::Number(3.0), Shadow::Number(4.0)),
            ]);
            assert_eq!(plain(&map), "Map(2) { 1 => 2, 3 => 4 }");
            assert_eq!(plain(&Shadow::WeakSet), "WeakSet { <items unknown> }");
            assert_eq!(plain(&Shadow::WeakMap), "WeakMap { <items unknown> }");
            assert_eq!(plain(&Shadow::WeakRef), "WeakRef { {} }");
        }

        #[test]
        fn test_promises() {
            assert_eq!(plain(&Shadow::Promise(PromiseShadow::Pending)), "Promise { <pending> }");
            assert_eq!(
                plain(&Shadow::Promise(PromiseShadow::Fulfilled(Box::new(Shadow::string("yes"))))),
                "Promise { 'yes' }"
            );
            assert_eq!(
                plain(&Shadow::Promise(PromiseShadow::Rejected(Box::new(Shadow::string("no"))))),
                "Promise { <rejected> 'no' }"
            );
        }

        #[test]
        fn test_typed_array_date_regexp() {
            let typed = Shadow::TypedArray {
                kind: TypedArrayKind::Int8,
                values: vec![1.0, 2.0, 3.0],
            };
            assert_eq!(plain(&typed), "Int8Array(3) [ 1, 2, 3 ]");
            assert_eq!(plain(&Shadow::Date(0.0)), "1970-01-01T00:00:00.000Z");
            assert_eq!(plain(&Shadow::Date(f64::NAN)), "Invalid Date");
            let regexp = Shadow::RegExp {
                source: "^a".into(),
                flags: "gi".into(),
            };
            assert_eq!(plain(&regexp), "/^a/gi");
        }

        #[test]
        fn test_errors() {
            let bare = ErrorShadow::new(ErrorKind::TypeError, "x");
            assert_eq!(plain(&Shadow::Error(Box::new(bare.clone()))), "[TypeError: x]");

            let mut with_stack = bare.clone();
            with_stack.stack = Some("TypeError: x\n    at f (a.js:1)".into());
            assert_eq!(
                plain(&Shadow::Error(Box::new(with_stack.clone()))),
                "TypeError: x\n    at f (a.js:1)"
            );

            with_stack.props.insert("code", Shadow::string("E"));
            assert_eq!(
                plain(&Shadow::Error(Box::new(with_stack))),
                "TypeError: x\n    at f (a.js:1) {\n  code: 'E'\n}"
            );

            let mut with_props = bare;
            with_props.props.insert("code", Shadow::string("E"));
            assert_eq!(plain(&Shadow::Error(Box::new(with_props))), "[TypeError: x] { code: 'E' }");
        }
    }

    mod dom_tests {
        use super::*;

        #[test]
        fn test_synthetic_nodes_use_hook() {
            let element = Synthetic::Element {
                tag: "p".into(),
                attrs: vec![Attr::new("id", "a")],
                children: vec![Shadow::Synthetic(Synthetic::Text("hi".into()))],
            };
            assert_eq!(inspect_synthetic(&element, &InspectOptions::default()), "<p id=\"a\">hi</p>");
            let list = Shadow::Synthetic(Synthetic::NodeList {
                kind: NodeListKind::HtmlCollection,
                children: vec![Shadow::Synthetic(element)],
            });
            assert_eq!(plain(&list), "HTMLCollection [<p id=\"a\">hi</p>]");
            let object = Shadow::object([("node", Shadow::Synthetic(Synthetic::Comment("c".into())))]);
            assert_eq!(plain(&object), "{ node: <!--c--> }");
        }

        #[test]
        fn test_colors_applied() {
            let colored = InspectOptions::default().with_colors(true);
            let out = inspect(&Shadow::Number(1.0), &colored);
            assert!(out.contains("\u{1b}["));
            assert_eq!(console::strip_ansi_codes(&out), "1");
        }
    }

    mod console_format_tests {
        use super::*;

        fn format(args: &[Shadow]) -> String {
            format_console(args, &InspectOptions::default())
        }

        #[test]
        fn test_plain_arguments() {
            assert_eq!(format(&[Shadow::string("a"), Shadow::Number(1.0)]), "a 1");
            assert_eq!(
                format(&[Shadow::object([("a", Shadow::Number(1.0))]), Shadow::string("b")]),
                "{ a: 1 } b"
            );
            assert_eq!(format(&[]), "");
        }

        #[test]
        fn test_specifiers() {
            assert_eq!(
                format(&[Shadow::string("%s is %d"), Shadow::string("x"), Shadow::Number(42.0)]),
                "x is 42"
            );
            assert_eq!(format(&[Shadow::string("%i"), Shadow::Number(42.9)]), "42");
            assert_eq!(format(&[Shadow::string("%f"), Shadow::string("1.5abc")]), "1.5");
            assert_eq!(
                format(&[Shadow::string("%j"), Shadow::object([("a", Shadow::Number(1.0))])]),
                "{\"a\":1}"
            );
            assert_eq!(format(&[Shadow::string("100%%")]), "100%");
            assert_eq!(format(&[Shadow::string("%c"), Shadow::string("color: red")]), "");
            assert_eq!(format(&[Shadow::string("%s")]), "%s");
        }

        #[test]
        fn test_extra_arguments_appended() {
            assert_eq!(
                format(&[Shadow::string("%s"), Shadow::string("a"), Shadow::Number(2.0)]),
                "a 2"
            );
        }

        #[test]
        fn test_object_with_s_is_inspected_shallow() {
            let nested = Shadow::object([("a", Shadow::object([("b", Shadow::Number(1.0))]))]);
            assert_eq!(format(&[Shadow::string("%s"), nested]), "{ a: [Object] }");
        }
    }
}
