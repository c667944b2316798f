//! Step tables for both build strategies.
//!
//! Each step knows which error category its failures fall into, so strategy
//! code can fail with plain errors and let [`StepDef::attribute`] attach the
//! step identity.

use std::path::PathBuf;

use crate::error::{ProvisionError, StepId};

/// Error category a failing step maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Dependencies,
    Acquisition,
    Preparation,
    Build,
    Artifact,
    Install,
}

/// One row of a strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDef {
    pub id: StepId,
    pub kind: StepKind,
}

impl StepDef {
    const fn new(
        strategy: &'static str,
        number: u8,
        total: u8,
        label: &'static str,
        kind: StepKind,
    ) -> Self {
        Self {
            id: StepId {
                strategy,
                number,
                total,
                label,
            },
            kind,
        }
    }

    /// Progress banner, e.g. `[12/14] Building module`.
    pub fn banner(&self) -> String {
        format!("[{}/{}] {}", self.id.number, self.id.total, self.id.label)
    }

    /// Attach this step's identity to an error raised while it ran.
    ///
    /// Errors already tied to a step pass through unchanged. An unconfirmed
    /// activation keeps its category and gains this step.
    pub fn attribute(&self, err: ProvisionError) -> ProvisionError {
        if err.step().is_some() {
            return err;
        }
        if let ProvisionError::EnvironmentUnready { module, reason, .. } = err {
            return ProvisionError::EnvironmentUnready {
                module,
                reason,
                step: Some(self.id),
            };
        }
        let step = self.id;
        let message = err.to_string();
        match self.kind {
            StepKind::Dependencies => ProvisionError::DependencyInstallFailed { step, message },
            StepKind::Acquisition => ProvisionError::SourceAcquisitionFailed { step, message },
            StepKind::Preparation => ProvisionError::SourcePreparationFailed { step, message },
            // a missing artifact is reported through `missing`; anything else
            // going wrong while looking for it is a build problem
            StepKind::Build | StepKind::Artifact => ProvisionError::BuildFailed { step, message },
            StepKind::Install => ProvisionError::InstallFailed { step, message },
        }
    }

    /// Missing-artifact error for this step.
    pub fn missing(&self, path: PathBuf) -> ProvisionError {
        ProvisionError::ArtifactMissing {
            step: self.id,
            path,
        }
    }
}

const DNF: &str = "dnf";
const APT: &str = "apt";

pub const DNF_INSTALL_TOOLS: StepDef =
    StepDef::new(DNF, 1, 14, "Installing build tools", StepKind::Dependencies);
pub const DNF_BUILD_TREE: StepDef =
    StepDef::new(DNF, 2, 14, "Creating rpmbuild tree", StepKind::Preparation);
pub const DNF_DOWNLOAD: StepDef =
    StepDef::new(DNF, 3, 14, "Downloading kernel source package", StepKind::Acquisition);
pub const DNF_LOCATE_SRPM: StepDef =
    StepDef::new(DNF, 4, 14, "Locating source package", StepKind::Acquisition);
pub const DNF_BUILDDEP: StepDef =
    StepDef::new(DNF, 5, 14, "Installing build dependencies", StepKind::Dependencies);
pub const DNF_INSTALL_SRPM: StepDef =
    StepDef::new(DNF, 6, 14, "Unpacking source package", StepKind::Preparation);
pub const DNF_PREP: StepDef =
    StepDef::new(DNF, 7, 14, "Preparing kernel source", StepKind::Preparation);
pub const DNF_FIND_TREE: StepDef =
    StepDef::new(DNF, 8, 14, "Locating source tree", StepKind::Preparation);
pub const DNF_EXTRAVERSION: StepDef =
    StepDef::new(DNF, 9, 14, "Matching kernel version", StepKind::Preparation);
pub const DNF_CONFIGURE: StepDef =
    StepDef::new(DNF, 10, 14, "Configuring kernel", StepKind::Preparation);
pub const DNF_MODULES_PREPARE: StepDef =
    StepDef::new(DNF, 11, 14, "Preparing module build", StepKind::Build);
pub const DNF_COMPILE: StepDef =
    StepDef::new(DNF, 12, 14, "Building module", StepKind::Build);
pub const DNF_LOCATE_ARTIFACT: StepDef =
    StepDef::new(DNF, 13, 14, "Locating built module", StepKind::Artifact);
pub const DNF_INSTALL: StepDef =
    StepDef::new(DNF, 14, 14, "Installing module", StepKind::Install);

/// rpm/dnf full source rebuild, in order.
pub const DNF_STEPS: [StepDef; 14] = [
    DNF_INSTALL_TOOLS,
    DNF_BUILD_TREE,
    DNF_DOWNLOAD,
    DNF_LOCATE_SRPM,
    DNF_BUILDDEP,
    DNF_INSTALL_SRPM,
    DNF_PREP,
    DNF_FIND_TREE,
    DNF_EXTRAVERSION,
    DNF_CONFIGURE,
    DNF_MODULES_PREPARE,
    DNF_COMPILE,
    DNF_LOCATE_ARTIFACT,
    DNF_INSTALL,
];

pub const APT_CHECK_HEADERS: StepDef =
    StepDef::new(APT, 1, 6, "Checking kernel headers", StepKind::Dependencies);
pub const APT_WORKSPACE: StepDef =
    StepDef::new(APT, 2, 6, "Preparing workspace", StepKind::Preparation);
pub const APT_FETCH: StepDef =
    StepDef::new(APT, 3, 6, "Downloading driver source", StepKind::Acquisition);
pub const APT_MAKEFILE: StepDef =
    StepDef::new(APT, 4, 6, "Writing Makefile", StepKind::Preparation);
pub const APT_COMPILE: StepDef = StepDef::new(APT, 5, 6, "Building module", StepKind::Build);
pub const APT_INSTALL: StepDef = StepDef::new(APT, 6, 6, "Installing module", StepKind::Install);

/// apt/dpkg out-of-tree build, in order.
pub const APT_STEPS: [StepDef; 6] = [
    APT_CHECK_HEADERS,
    APT_WORKSPACE,
    APT_FETCH,
    APT_MAKEFILE,
    APT_COMPILE,
    APT_INSTALL,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_table(table: &[StepDef], strategy: &str) {
        for (i, step) in table.iter().enumerate() {
            assert_eq!(step.id.strategy, strategy);
            assert_eq!(usize::from(step.id.number), i + 1);
            assert_eq!(usize::from(step.id.total), table.len());
        }
    }

    #[test]
    fn tables_are_numbered_in_order() {
        assert_table(&DNF_STEPS, "dnf");
        assert_table(&APT_STEPS, "apt");
    }

    #[test]
    fn banner_format() {
        assert_eq!(DNF_COMPILE.banner(), "[12/14] Building module");
        assert_eq!(APT_CHECK_HEADERS.banner(), "[1/6] Checking kernel headers");
    }

    #[test]
    fn command_failure_becomes_step_category() {
        let raw = ProvisionError::CommandFailed {
            command: "make M=drivers/acpi modules".into(),
            code: Some(2),
        };
        let err = DNF_COMPILE.attribute(raw);
        match &err {
            ProvisionError::BuildFailed { step, message } => {
                assert_eq!(step.number, 12);
                assert!(message.contains("make M=drivers/acpi modules"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.to_string().contains("dnf step 12/14"));
    }

    #[test]
    fn attributed_errors_are_not_rewrapped() {
        let first = APT_FETCH.attribute(ProvisionError::Other(anyhow::anyhow!("HTTP 404")));
        let again = APT_COMPILE.attribute(first);
        assert!(matches!(
            again,
            ProvisionError::SourceAcquisitionFailed { step, .. } if step.number == 3
        ));
    }

    #[test]
    fn unready_keeps_category_and_gains_step() {
        let err = DNF_INSTALL.attribute(ProvisionError::EnvironmentUnready {
            module: "ec_sys".into(),
            reason: "write_support not enabled".into(),
            step: None,
        });
        assert!(matches!(err, ProvisionError::EnvironmentUnready { .. }));
        assert_eq!(err.step(), Some(DNF_INSTALL.id));
    }

    #[test]
    fn categories_per_step() {
        let io = || ProvisionError::Io(std::io::Error::other("boom"));
        assert!(matches!(
            DNF_INSTALL_TOOLS.attribute(io()),
            ProvisionError::DependencyInstallFailed { .. }
        ));
        assert!(matches!(
            DNF_EXTRAVERSION.attribute(io()),
            ProvisionError::SourcePreparationFailed { .. }
        ));
        assert!(matches!(
            APT_INSTALL.attribute(io()),
            ProvisionError::InstallFailed { .. }
        ));
    }
}
