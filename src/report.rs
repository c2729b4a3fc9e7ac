use std::cell::RefCell;
use std::fmt;

/// Things the lifecycle engine tells the user about.
///
/// Plain data: rendering (colors, banners) is up to the [Reporter].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A lifecycle operation begins
    Operation(String),
    /// A queued command completed successfully
    Executed(String),
    /// A queued command that debug mode did not execute
    DryRun(String),
    BranchCreated { branch: String, base: String },
    Merged { source: String, target: String },
    Tagged { tag: String },
    /// Unresolved paths found while finishing into `target`
    ConflictsFound { target: String, paths: Vec<String> },
    BranchDeleted { branch: String, remote: bool },
    /// Remote deletion skipped because the branch was never pushed
    RemoteDeleteSkipped { branch: String },
    Switched { branch: String },
    Info(String),
    Warning(String),
}

impl Event {
    /// Whether the event describes something that went wrong
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::ConflictsFound { .. } | Event::Warning(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Operation(title) => write!(f, "{}", title),
            Event::Executed(command) => write!(f, "{}", command),
            Event::DryRun(command) => write!(f, "[dry run] {}", command),
            Event::BranchCreated { branch, base } => {
                write!(f, "Created branch '{}' from '{}'", branch, base)
            }
            Event::Merged { source, target } => {
                write!(f, "Merged '{}' into '{}'", source, target)
            }
            Event::Tagged { tag } => write!(f, "Tagged '{}'", tag),
            Event::ConflictsFound { target, paths } => write!(
                f,
                "Unresolved conflicts merging into '{}': {}",
                target,
                paths.join(", ")
            ),
            Event::BranchDeleted { branch, remote } => {
                if *remote {
                    write!(f, "Deleted remote branch '{}'", branch)
                } else {
                    write!(f, "Deleted branch '{}'", branch)
                }
            }
            Event::RemoteDeleteSkipped { branch } => write!(
                f,
                "Branch '{}' does not exist on the remote, skipping remote deletion",
                branch
            ),
            Event::Switched { branch } => write!(f, "Switched to '{}'", branch),
            Event::Info(message) | Event::Warning(message) => write!(f, "{}", message),
        }
    }
}

/// Receives lifecycle events
pub trait Reporter {
    fn report(&self, event: &Event);
}

/// Reporter that only keeps the events, for tests and programmatic callers
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}
