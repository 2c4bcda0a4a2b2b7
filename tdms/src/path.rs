use crate::error::{TdmsError, TdmsResult};

/// A parsed TDMS object path: `/`, `/'group'` or `/'group'/'channel'`.
/// Single quotes inside a name are escaped by doubling them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ObjectPath {
    Root,
    Group(String),
    Channel { group: String, channel: String },
}

impl ObjectPath {
    pub(crate) fn parse(path: &str) -> TdmsResult<Self> {
        let malformed = || TdmsError::MalformedPath(path.to_owned());

        let rest = path.strip_prefix('/').ok_or_else(malformed)?;
        let mut names = Vec::new();
        let mut chars = rest.chars().peekable();

        while chars.peek().is_some() {
            if chars.next() != Some('\'') {
                return Err(malformed());
            }
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        name.push('\'');
                    }
                    Some('\'') => break,
                    Some(c) => name.push(c),
                    None => return Err(malformed()),
                }
            }
            names.push(name);
            match chars.next() {
                Some('/') if chars.peek().is_some() => {}
                None => {}
                _ => return Err(malformed()),
            }
        }

        let mut names = names.into_iter();
        match (names.next(), names.next(), names.next()) {
            (None, _, _) => Ok(Self::Root),
            (Some(group), None, _) => Ok(Self::Group(group)),
            (Some(group), Some(channel), None) => Ok(Self::Channel { group, channel }),
            _ => Err(malformed()),
        }
    }
}

/// Formats a name as it appears quoted in an object path.
#[cfg(any(test, feature = "test-utils"))]
pub(crate) fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
