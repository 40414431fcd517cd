//! Status vocabularies and small field derivations shared by the reports

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Normalized enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentState {
    Active,
    Invited,
    Inactive,
    Concluded,
    Deleted,
    Rejected,
}

impl EnrollmentState {
    /// Combines a membership's own state with its parents' deletion state
    ///
    /// A deleted section or course forces `deleted` regardless of the
    /// membership's own state. Unknown own states yield `None`.
    pub fn normalize(section_state: &str, course_state: &str, own_state: &str) -> Option<Self> {
        if section_state == "deleted" || course_state == "deleted" {
            return Some(EnrollmentState::Deleted);
        }
        match own_state {
            "invited" | "creation_pending" => Some(EnrollmentState::Invited),
            "active" => Some(EnrollmentState::Active),
            "completed" => Some(EnrollmentState::Concluded),
            "inactive" => Some(EnrollmentState::Inactive),
            "deleted" => Some(EnrollmentState::Deleted),
            "rejected" => Some(EnrollmentState::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentState::Active => "active",
            EnrollmentState::Invited => "invited",
            EnrollmentState::Inactive => "inactive",
            EnrollmentState::Concluded => "concluded",
            EnrollmentState::Deleted => "deleted",
            EnrollmentState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Course status in the strict import vocabulary
///
/// Everything that is neither deleted nor completed is `active` there.
pub fn sis_course_status(workflow_state: &str) -> &str {
    match workflow_state {
        "deleted" | "completed" => workflow_state,
        _ => "active",
    }
}

/// Course status in the provisioning vocabulary
pub fn provisioning_course_status(workflow_state: &str) -> Option<&'static str> {
    match workflow_state {
        "claimed" | "created" => Some("unpublished"),
        "available" => Some("active"),
        "completed" => Some("concluded"),
        "deleted" => Some("deleted"),
        _ => None,
    }
}

const BUILT_IN_ROLES: [(&str, &str); 5] = [
    ("StudentEnrollment", "student"),
    ("TeacherEnrollment", "teacher"),
    ("TaEnrollment", "ta"),
    ("DesignerEnrollment", "designer"),
    ("ObserverEnrollment", "observer"),
];

/// Role name as written in the role column
///
/// Built-in roles share their name with the enrollment type and map to the
/// short import name; custom roles are reported by their own name.
pub fn sis_role(enrollment_type: &str, role_name: Option<&str>) -> Option<String> {
    if let Some(name) = role_name {
        if !BUILT_IN_ROLES.iter().any(|(ty, _)| *ty == name) {
            return Some(name.to_string());
        }
    }
    BUILT_IN_ROLES
        .iter()
        .find(|(ty, _)| *ty == enrollment_type)
        .map(|(_, short)| short.to_string())
}

static SUFFIXES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Sn?r\.?|Senior|Jn?r\.?|Junior|II|III|IV|V|VI|Esq\.?|Esquire)$").unwrap()
});

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Parts of a person's name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    pub given: Option<String>,
    pub surname: Option<String>,
    pub suffix: Option<String>,
}

/// Splits a sortable name ("Doe, John Jr.") into given name, surname and suffix
///
/// Without a comma the last word is taken as the surname.
pub fn name_parts(name: &str) -> NameParts {
    let name = name.trim();
    if name.is_empty() {
        return NameParts::default();
    }

    let mut pieces = COMMA.splitn(name, 3);
    let first = pieces.next().map(str::to_string);
    let second = pieces.next().map(str::to_string);
    let third = pieces.next().map(str::to_string);

    let (mut surname, given, mut suffix) = match (first, second, third) {
        (surname, Some(given), Some(suffix)) if !SUFFIXES.is_match(&suffix) => {
            (surname, format!("{given} {suffix}"), None)
        }
        (surname, Some(given), suffix) => (surname, given, suffix),
        _ => (None, name.to_string(), None),
    };

    let mut given_parts: Vec<&str> = given.split_whitespace().collect();
    if suffix.is_none() && given_parts.len() > 1 {
        if let Some(last) = given_parts.last() {
            if SUFFIXES.is_match(last) {
                suffix = given_parts.pop().map(str::to_string);
            }
        }
    }

    if surname.is_none() && given_parts.len() > 1 {
        surname = given_parts.pop().map(str::to_string);
    }

    NameParts {
        given: (!given_parts.is_empty()).then(|| given_parts.join(" ")),
        surname: surname.filter(|s| !s.is_empty()),
        suffix,
    }
}
