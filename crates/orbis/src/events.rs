use crate::geometry::{Point, Viewport};
use crate::layout::ItemId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Show,
    Hide,
    Click,
    DragStart(Point),
    DragMove(Point),
    DragEnd(Point),
    HoverEnter(ItemId),
    HoverLeave(ItemId),
    Resize(Viewport),
    Dump,
    ConfigReload,
}

#[derive(Debug, Error, PartialEq)]
pub enum EventParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Arguments {
        command: String,
        expected: &'static str,
    },
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => write!(f, "show"),
            Self::Hide => write!(f, "hide"),
            Self::Click => write!(f, "click"),
            Self::DragStart(p) => write!(f, "drag-start {} {}", p.x, p.y),
            Self::DragMove(p) => write!(f, "drag {} {}", p.x, p.y),
            Self::DragEnd(p) => write!(f, "drag-end {} {}", p.x, p.y),
            Self::HoverEnter(id) => write!(f, "hover {}", id),
            Self::HoverLeave(id) => write!(f, "unhover {}", id),
            Self::Resize(v) => write!(f, "resize {} {}", v.width, v.height),
            Self::Dump => write!(f, "dump"),
            Self::ConfigReload => write!(f, "reload"),
        }
    }
}

impl FromStr for AppEvent {
    type Err = EventParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(EventParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        let pair = |expected: &'static str| -> Result<(f64, f64), EventParseError> {
            let err = || EventParseError::Arguments {
                command: command.to_string(),
                expected,
            };
            let number = |word: &str| match word.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(err()),
            };
            match args.as_slice() {
                [a, b] => Ok((number(*a)?, number(*b)?)),
                _ => Err(err()),
            }
        };
        let id = || match args.as_slice() {
            [id] => Ok(ItemId::new(*id)),
            _ => Err(EventParseError::Arguments {
                command: command.to_string(),
                expected: "an item id",
            }),
        };

        let event = match command.to_ascii_lowercase().as_str() {
            "show" | "open" => Self::Show,
            "hide" | "close" => Self::Hide,
            "click" => Self::Click,
            "dump" => Self::Dump,
            "reload" => Self::ConfigReload,
            "drag-start" => {
                let (x, y) = pair("x y")?;
                Self::DragStart(Point::new(x, y))
            }
            "drag" => {
                let (x, y) = pair("x y")?;
                Self::DragMove(Point::new(x, y))
            }
            "drag-end" => {
                let (x, y) = pair("x y")?;
                Self::DragEnd(Point::new(x, y))
            }
            "resize" => {
                let (w, h) = pair("width height")?;
                Self::Resize(Viewport::new(w, h))
            }
            "hover" => Self::HoverEnter(id()?),
            "unhover" => Self::HoverLeave(id()?),
            other => return Err(EventParseError::Unknown(other.to_string())),
        };
        Ok(event)
    }
}
