use serde::Deserialize;

/// How the supervisor decides that a freshly spawned process is usable.
///
/// - `Tcp`: poll a TCP connect against `probe.address` until it succeeds or
///   the probe timeout elapses (default).
/// - `None`: treat the process as ready as soon as it has been spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Tcp,
    None,
}

impl Default for ProbeKind {
    fn default() -> Self {
        ProbeKind::Tcp
    }
}

/// Icon hint paired with the status label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    None,
    Connect,
}

/// Kind of modal dialog the toolkit is asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Dismissal terminates the program.
    Fatal,
    /// Dismissal lets the next queued error surface.
    Error,
}
