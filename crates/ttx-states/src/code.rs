use serde::{Serialize, Serializer};

/// Postal codes of the jurisdictions this engine implements.  The set is
/// closed: adding a state means adding a variant here and a module.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateCode {
    Ga,
    La,
    Sc,
    Ut,
    Mo,
    Ok,
}

impl StateCode {
    pub const ALL: [StateCode; 6] = [
        StateCode::Ga,
        StateCode::La,
        StateCode::Sc,
        StateCode::Ut,
        StateCode::Mo,
        StateCode::Ok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateCode::Ga => "GA",
            StateCode::La => "LA",
            StateCode::Sc => "SC",
            StateCode::Ut => "UT",
            StateCode::Mo => "MO",
            StateCode::Ok => "OK",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.  `None` for any
    /// code without a module.
    pub fn parse(raw: &str) -> Option<StateCode> {
        let raw = raw.trim();
        StateCode::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for StateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StateCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
