use serde::Serialize;

pub const MISSING_FIELDS_MESSAGE: &str = "Please enter both name and phone number";

/// The two states of the time clock toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PunchDirection {
    Login,
    Logout,
}

impl PunchDirection {
    pub fn from_state(is_logged_in: bool) -> Self {
        if is_logged_in {
            Self::Logout
        } else {
            Self::Login
        }
    }

    pub fn logged_in_after(self) -> bool {
        matches!(self, Self::Login)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PunchInput {
    pub name: String,
    pub phone_number: String,
}

impl PunchInput {
    /// Both fields are required; surrounding whitespace does not count.
    pub fn parse(name: Option<&str>, phone_number: Option<&str>) -> Option<Self> {
        let name = name.map(str::trim).filter(|s| !s.is_empty())?;
        let phone_number = phone_number.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        })
    }
}

pub fn punch_message(
    direction: PunchDirection,
    name: &str,
    local_clock: &str,
    worked_hours: Option<f64>,
) -> String {
    match (direction, worked_hours) {
        (PunchDirection::Login, _) => {
            format!("Welcome {}! You are now logged in at {}.", name, local_clock)
        }
        (PunchDirection::Logout, Some(hours)) => format!(
            "Goodbye {}! You logged out at {} and worked for {} hours today.",
            name, local_clock, hours
        ),
        (PunchDirection::Logout, None) => {
            format!("Goodbye {}! Logged out successfully at {}.", name, local_clock)
        }
    }
}
