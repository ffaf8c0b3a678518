/// What a single reconciliation cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The public IP could not be resolved; nothing was touched
    ResolverUnavailable,

    /// The IP is unchanged since the last cycle; nothing was touched
    NoDrift,

    /// The bootstrap listing failed; it is retried on the next cycle
    BootstrapFailed,

    /// Records were checked and, where needed, updated
    Reconciled(CycleReport),
}

impl CycleOutcome {
    /// The cycle report, if the cycle got as far as reconciling
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Reconciled(report) => Some(report),
            _ => None,
        }
    }
}

/// Per-record results of a reconciled cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether this was the bootstrap cycle
    pub bootstrap: bool,

    /// Records whose content was updated this cycle
    pub changed: Vec<String>,

    /// Records that already carried the current IP
    pub unchanged: Vec<String>,

    /// Records whose update the provider refused or that could not be reached
    pub failed: Vec<String>,

    /// Records dropped from tracking during bootstrap
    pub removed: Vec<String>,
}

impl CycleReport {
    pub(crate) fn new(bootstrap: bool) -> Self {
        Self {
            bootstrap,
            ..Self::default()
        }
    }

    /// Number of provider update calls the cycle issued
    pub fn update_calls(&self) -> usize {
        self.changed.len() + self.failed.len()
    }
}
