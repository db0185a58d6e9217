use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while_m_n};
use nom::character::complete::{char, multispace0};
use nom::character::is_alphanumeric;
use nom::combinator::{all_consuming, map_res};
use nom::error::convert_error;
use nom::error::FromExternalError;
use nom::error::ParseError;
use nom::error::VerboseError;
use nom::multi::many0;
use nom::number::complete::float;
use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
use nom::AsChar;
use nom::InputTakeAtPosition;
use nom::{Err, IResult};

use crossbeam_channel::{unbounded, TryRecvError};
use notify::{event::ModifyKind, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeMap;

/// Tries to parse an entire theme file.
pub fn try_parse_theme(theme: &str) -> Option<Vec<Rule>> {
    match all_consuming(terminated(rules::<VerboseError<&str>>, multispace0))(theme) {
        Ok((_, rules)) => Some(rules),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => {
            log::info!("Failed to load the theme.");
            log::info!("Trace: {}", convert_error(theme, e));
            None
        }
        Err(Err::Incomplete(_)) => {
            log::info!("Unexpected EOF loading the theme.");
            None
        }
    }
}

/// The style table applied to the rendered map.
///
/// The theme file is watched so edits show up on the next frame.
pub struct ThemeCache {
    pub rules: Vec<Rule>,
    rx: crossbeam_channel::Receiver<std::result::Result<notify::event::Event, notify::Error>>,
    _watcher: RecommendedWatcher,
}

impl ThemeCache {
    /// Tries to create a new theme cache from a given theme file path.
    pub fn try_load_from_file(filename: impl Into<String>) -> Option<Self> {
        let filename = filename.into();

        let contents = match std::fs::read_to_string(&filename) {
            Ok(contents) => contents,
            Err(err) => {
                log::info!("Failed to read the theme file {}:", filename);
                log::info!("{}", err);
                return None;
            }
        };

        let (tx, rx) = unbounded();

        let mut watcher: RecommendedWatcher = match Watcher::new_immediate(tx) {
            Ok(watcher) => watcher,
            Err(err) => {
                log::info!("Failed to create a watcher for the theme:");
                log::info!("{}", err);
                return None;
            }
        };

        match watcher.watch(&filename, RecursiveMode::Recursive) {
            Ok(_) => {}
            Err(err) => {
                log::info!("Failed to start watching {}:", filename);
                log::info!("{}", err);
                return None;
            }
        };

        let rules = try_parse_theme(&contents)?;

        Some(Self {
            rules,
            rx,
            _watcher: watcher,
        })
    }

    /// Returns all rules that match a given selector.
    pub fn get_matching_rules(&self, selector: &Selector) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|rule| selector.matches(&rule.selector))
            .collect()
    }

    /// Looks up a color for an element type, falling back to `default`.
    pub fn color(&self, typ: &str, key: &str, default: Color) -> Color {
        self.value(typ, key)
            .and_then(|v| match v {
                StyleValue::Color(c) => Some(c.clone()),
                _ => None,
            })
            .unwrap_or(default)
    }

    /// Looks up a numeric value (px or unitless) for an element type.
    pub fn number(&self, typ: &str, key: &str, default: f32) -> f32 {
        self.value(typ, key)
            .and_then(|v| match v {
                StyleValue::Px(n) | StyleValue::Number(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(default)
    }

    fn value(&self, typ: &str, key: &str) -> Option<&StyleValue> {
        let selector = Selector::new().with_type(typ.into());
        // Later rules win, like in any ordinary stylesheet.
        self.get_matching_rules(&selector)
            .iter()
            .rev()
            .find_map(|rule| rule.kvs.get(key))
    }

    /// Updates the theme from the watched file if there were any changes.
    ///
    /// Returns whether a successful update happened. A failed reload keeps
    /// the previous rules.
    pub fn update(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(Ok(notify::event::Event {
                kind: EventKind::Modify(ModifyKind::Data(_)),
                paths,
                ..
            })) => self.try_reload_from_file(paths[0].as_path()),
            // Everything is alright but the file wasn't actually changed.
            Ok(Ok(_)) => false,
            Ok(Err(err)) => {
                log::info!("Something went wrong with the theme file watcher:\r\n{:?}", err);
                false
            }
            // This happens all the time when there is no new message.
            Err(TryRecvError::Empty) => false,
            Err(err) => {
                log::info!("Something went wrong with the theme file watcher:\r\n{:?}", err);
                false
            }
        }
    }

    fn try_reload_from_file(&mut self, filename: &std::path::Path) -> bool {
        match std::fs::read_to_string(filename) {
            Ok(contents) => {
                self.rules = match try_parse_theme(&contents) {
                    Some(rules) => rules,
                    None => return false,
                }
            }
            Err(err) => {
                log::info!("Failed to read file at {:?}:", filename);
                log::info!("{}", err);
                return false;
            }
        }
        true
    }
}

/// A single theme rule including its selector.
#[derive(Debug)]
pub struct Rule {
    pub selector: Selector,
    /// The key/value pairs the rule holds.
    pub kvs: BTreeMap<String, StyleValue>,
}

/// A single theme selector.
///
/// Matches an element type (`map`, `marker`, `cluster`, `popup`, `searchbox`)
/// with optional classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub typ: Option<String>,
    pub classes: Vec<String>,
}

impl Selector {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_type(mut self, typ: String) -> Self {
        self.typ = Some(typ);
        self
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.classes.push(class);
        self
    }

    /// Checks if a subset of criteria of this selector matches all the
    /// criteria of another.
    pub fn matches(&self, other: &Selector) -> bool {
        if let Some(t1) = &other.typ {
            match &self.typ {
                Some(t2) if t1 == t2 => {}
                _ => return false,
            }
        }

        for class in &other.classes {
            if !self.classes.contains(class) {
                return false;
            }
        }

        true
    }
}

/// Any type of theme value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Represents any value as a string.
    Str(String),
    Color(Color),
    /// A pixel dimension, e.g. `48px`.
    Px(f32),
    Number(f32),
}

/// A struct to represent any RGB color.
#[derive(Debug, PartialEq, Clone)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };

    /// The color as normalized RGBA components.
    pub fn components(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }
}

/// Parses an entire set of rules.
fn rules<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Rule>, E> {
    many0(rule)(input)
}

/// Munch all whitespace before and after `f`.
fn whitespace<I, O, E, F>(f: F) -> impl FnMut(I) -> IResult<I, O, E>
where
    I: Clone + PartialEq + InputTakeAtPosition,
    <I as InputTakeAtPosition>::Item: AsChar + Clone,
    F: FnMut(I) -> IResult<I, O, E>,
    E: ParseError<I>,
{
    delimited(multispace0, f, multispace0)
}

/// Parse a single rule.
/// E.g. `cluster { fill: #7C2F42; width: 48px; }`.
fn rule<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Rule, E> {
    let (remaining, (selector, _, kvs, _)) = tuple((
        whitespace(selector),
        whitespace(char('{')),
        body,
        whitespace(char('}')),
    ))(input)?;

    Ok((remaining, Rule { selector, kvs }))
}

/// Parse a single selector.
/// E.g. `cluster.large`.
fn selector<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Selector, E> {
    let mut selector: Selector = Default::default();

    let (remaining, typ) = take_while(|c| is_alphanumeric(c as u8))(input)?;
    selector.typ = if !typ.is_empty() { Some(typ.into()) } else { None };

    let (remaining, classes) = many0(class)(remaining)?;
    selector.classes = classes;

    Ok((remaining, selector))
}

/// Parse a single class name.
/// E.g. `.large`.
fn class<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    preceded(char('.'), take_while(|c| is_alphanumeric(c as u8)))(input)
        .map(|(r, v): (&str, &str)| (r, v.into()))
}

/// Parses the body of a rule.
fn body<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, BTreeMap<String, StyleValue>, E> {
    let mut kvs = BTreeMap::new();
    many0(kv)(input).map(|(remaining, pairs)| {
        pairs.into_iter().for_each(|(k, v)| {
            kvs.insert(k.into(), v);
        });
        (remaining, kvs)
    })
}

/// Parses a single k/v pair.
/// E.g. `text-color: #F1F1F3;`.
fn kv<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, StyleValue), E> {
    let (remaining, (pair, _)) =
        tuple((separated_pair(style_name, char(':'), style_value), char(';')))(input)?;
    Ok((remaining, pair))
}

/// Parses a qualified style name.
/// Can contain alphanumeric characters and '-'.
fn style_name<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    whitespace(take_while(|c| is_alphanumeric(c as u8) || c == '-'))(input)
}

/// Parses a single qualified style value.
fn style_value<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, StyleValue, E> {
    alt((
        whitespace(hex_color),
        whitespace(rgba_color),
        whitespace(px_value),
        whitespace(unitless_value),
        whitespace(string),
    ))(input)
}

/// Parses a single qualified string value.
fn string<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, StyleValue, E> {
    let (input, value) =
        whitespace(take_while(|c| is_alphanumeric(c as u8) || c == '-' || c == ' '))(input)?;

    Ok((input, StyleValue::Str(value.into())))
}

/// Parses a single px value.
fn px_value<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, StyleValue, E> {
    let (input, (value, _)) = tuple((float, tag("px")))(input)?;

    Ok((input, StyleValue::Px(value)))
}

/// Parses a single unitless value.
fn unitless_value<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, StyleValue, E> {
    let (input, value) = float(input)?;

    Ok((input, StyleValue::Number(value)))
}

/// Converts a hex string into an `u8`.
fn from_hex(input: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(input, 16)
}

/// `true` if `c` is a valid hexadecimal digit.
fn is_hex_digit(c: char) -> bool {
    c.is_digit(16)
}

/// Parse an actual hex code.
fn hex_primary<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, u8, E> {
    map_res(take_while_m_n(2, 2, is_hex_digit), from_hex)(input)
}

/// Parse a single hex color code including the `#`.
fn hex_color<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, StyleValue, E> {
    let (input, _) = tag("#")(input)?;
    let (input, (r, g, b)) = tuple((hex_primary, hex_primary, hex_primary))(input)?;

    Ok((input, StyleValue::Color(Color { r, g, b, a: 1.0 })))
}

fn u8<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, u8, E> {
    use std::str::FromStr;
    map_res(take_while(|c: char| c.is_digit(10)), u8::from_str)(input)
}

/// Parse a single rgba color.
fn rgba_color<'a, E: ParseError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, StyleValue, E> {
    let (input, _) = whitespace(tag("rgba("))(input)?;
    let (input, (r, _, g, _, b, _, a)) = tuple((
        u8,
        whitespace(char(',')),
        u8,
        whitespace(char(',')),
        u8,
        whitespace(char(',')),
        float,
    ))(input)?;
    let (input, _) = tag(")")(input)?;
    Ok((input, StyleValue::Color(Color { r, g, b, a })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_representative_theme() {
        let rules = try_parse_theme(
            r#"
            map { background-color: #E9E5DC; }
            cluster {
                fill: rgba(124, 47, 66, 0.9);
                text-color: #F1F1F3;
                text-size: 18;
                width: 48px;
                height: 48px;
            }
            "#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector.typ.as_deref(), Some("map"));
        assert_eq!(
            rules[1].kvs.get("width"),
            Some(&StyleValue::Px(48.0))
        );
        assert_eq!(
            rules[1].kvs.get("text-size"),
            Some(&StyleValue::Number(18.0))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(try_parse_theme("cluster { width: 48px;").is_none());
    }

    #[test]
    fn later_rules_win() {
        let rules = try_parse_theme(
            "marker { fill: #000000; } marker { fill: #FFFFFF; }",
        )
        .unwrap();
        let selector = Selector::new().with_type("marker".into());

        let matching: Vec<_> = rules
            .iter()
            .filter(|rule| selector.matches(&rule.selector))
            .collect();
        assert_eq!(matching.len(), 2);
        assert_eq!(
            matching.last().unwrap().kvs.get("fill"),
            Some(&StyleValue::Color(Color {
                r: 255,
                g: 255,
                b: 255,
                a: 1.0
            }))
        );
    }

    #[test]
    fn classed_selector_only_matches_with_class() {
        let plain = Selector::new().with_type("cluster".into());
        let classed = Selector::new()
            .with_type("cluster".into())
            .with_class("large".into());

        assert!(classed.matches(&plain));
        assert!(!plain.matches(&classed));
    }
}
