//! Identifier resolution over the manager's process list.

use procgate_common::{Error, ManagedProcess, ProcessSummary, Result};

/// What a caller-supplied token resolved to.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The literal token `"all"`: every process, rendered with derived
    /// uptime.
    All(Vec<ProcessSummary>),
    /// A single process matched by id or name.
    One(ProcessSummary),
}

/// Resolves a token against the full process list.
///
/// A non-`"all"` token is matched in a single pass: the first process whose
/// stringified manager id equals the token OR whose name equals the token
/// wins. There is deliberately no priority between the two criteria; list
/// order decides. Changing that would change observable behavior for a
/// process whose name equals another process's id string.
pub fn resolve(
    token: &str,
    processes: &[ManagedProcess],
    now_millis: i64,
) -> Result<Resolution> {
    if token == "all" {
        return Ok(Resolution::All(
            processes
                .iter()
                .map(|p| ProcessSummary::render(p, now_millis))
                .collect(),
        ));
    }

    find_match(token, processes)
        .map(|p| Resolution::One(ProcessSummary::render(p, now_millis)))
        .ok_or_else(|| Error::not_found(token))
}

/// First process matching the token by id-string or by name, in list order.
pub fn find_match<'a>(token: &str, processes: &'a [ManagedProcess]) -> Option<&'a ManagedProcess> {
    processes
        .iter()
        .find(|p| p.id.to_string() == token || p.name == token)
}
