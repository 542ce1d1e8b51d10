//! Undo command synthesis for Comware configuration diffs
//!
//! Walks the body of an edit script once, left to right. Removed lines that
//! start with one of a fixed set of prefixes produce compensating `undo`
//! commands. Some objects only exist inside an enclosing view (a
//! `service-instance` lives under its interface, a BGP `ip vpn-instance`
//! under `bgp`), so those rules re-enter the view named by the preceding
//! script line, issue the undo and `quit` back out.

use super::config_diff::{ChangeKind, DiffLine};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Command leaving the view entered for a scoped undo
pub const QUIT: &str = "quit";

/// The recognized removal patterns, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoRule {
    ServiceInstance,
    VpnStaticRoute,
    Vsi,
    VpnInstance,
    VsiInterface,
    TunnelInterface,
}

impl UndoRule {
    /// Every rule, in the order prefixes are tested
    pub const ALL: [UndoRule; 6] = [
        UndoRule::ServiceInstance,
        UndoRule::VpnStaticRoute,
        UndoRule::Vsi,
        UndoRule::VpnInstance,
        UndoRule::VsiInterface,
        UndoRule::TunnelInterface,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            UndoRule::ServiceInstance => "service-instance",
            UndoRule::VpnStaticRoute => "ip route-static vpn-instance",
            UndoRule::Vsi => "vsi",
            UndoRule::VpnInstance => "ip vpn-instance",
            UndoRule::VsiInterface => "interface Vsi-interface",
            UndoRule::TunnelInterface => "interface Tunnel",
        }
    }

    /// First rule whose prefix starts `body`
    pub fn matching(body: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rule| body.starts_with(rule.prefix()))
    }

    /// Commands compensating for the removal of `body`.
    ///
    /// `last_line` is the raw script line preceding the removal, marker
    /// included.
    pub fn commands(self, body: &str, last_line: &str) -> Vec<String> {
        let undo = format!("undo {}", body);
        let enclosing = strip_marker(last_line);
        match self {
            UndoRule::ServiceInstance => scoped(enclosing, undo),
            UndoRule::VpnInstance if enclosing.starts_with("bgp") => scoped(enclosing, undo),
            UndoRule::VpnStaticRoute
            | UndoRule::Vsi
            | UndoRule::VpnInstance
            | UndoRule::VsiInterface
            | UndoRule::TunnelInterface => vec![undo],
        }
    }
}

fn scoped(view: &str, undo: String) -> Vec<String> {
    vec![view.to_string(), undo, QUIT.to_string()]
}

/// Drop the first character of a script line, whatever it is.
fn strip_marker(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

/// Result of one synthesis pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    /// Every added or removed line, in script order
    pub changed_lines: Vec<DiffLine>,
    /// Synthesized undo commands, in emission order
    pub commands: Vec<String>,
}

impl Synthesis {
    /// True when the script carried no change at all
    pub fn is_noop(&self) -> bool {
        self.changed_lines.is_empty()
    }

    /// Changed lines rendered with their markers
    pub fn list_diff(&self) -> Vec<String> {
        self.changed_lines.iter().map(ToString::to_string).collect()
    }

    fn absorb(mut self, line: &str, last_line: &str) -> Self {
        let mut chars = line.chars();
        let Some(kind) = chars.next().and_then(ChangeKind::from_marker) else {
            return self;
        };
        let body = chars.as_str();
        if body.is_empty() {
            return self;
        }

        if kind == ChangeKind::Removed {
            if let Some(rule) = UndoRule::matching(body) {
                let commands = rule.commands(body, last_line);
                trace!(?rule, removed = body, ?commands, "Synthesized undo commands");
                self.commands.extend(commands);
            }
        }

        self.changed_lines.push(DiffLine::new(kind, body));
        self
    }
}

/// Synthesize undo commands from the body of an edit script.
///
/// `diff_lines` must not include the script header. The only state carried
/// across lines is the previous raw line, updated after every line whether
/// or not a rule fired.
pub fn synthesize<I, S>(diff_lines: I) -> Synthesis
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (synthesis, _) = diff_lines.into_iter().fold(
        (Synthesis::default(), String::new()),
        |(synthesis, last_line), line| {
            let line = line.as_ref();
            (synthesis.absorb(line, &last_line), line.to_string())
        },
    );

    debug!(
        changed = synthesis.changed_lines.len(),
        undo = synthesis.commands.len(),
        "Undo synthesis complete"
    );
    synthesis
}
