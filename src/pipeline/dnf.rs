//! Full kernel source rebuild for rpm/dnf hosts.
//!
//! Fedora-family kernels ship without the EC debugfs driver, so the module
//! is built from the distribution's own source package, patched to the
//! running release so its symbol versions match.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::error::Result;
use crate::shell::CommandSpec;

use super::context::StepContext;
use super::source;
use super::steps::*;
use super::workspace::BuildWorkspace;

/// Toolchain packages installed in step 1, before `kernel-devel-<release>`.
const BUILD_TOOLS: &[&str] = &[
    "dnf-utils",
    "rpmdevtools",
    "ncurses-devel",
    "pesign",
    "elfutils-libelf-devel",
    "openssl-devel",
    "bison",
    "flex",
];

const SOURCE_REPOS: &[&str] = &["fedora-source", "updates-source"];

const RPM_TREE: &[&str] = &["BUILD", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// Run every dnf step in order and return the installed module path.
pub fn provision(ctx: &StepContext<'_>, workspace: &BuildWorkspace) -> Result<PathBuf> {
    let release = ctx.kernel.release();
    let topdir = workspace.path().join("rpmbuild");
    let topdir_define = format!("_topdir {}", topdir.display());

    ctx.step(&DNF_INSTALL_TOOLS, |ctx| {
        ctx.run_privileged(
            CommandSpec::new("dnf")
                .args(["install", "-y"])
                .args(BUILD_TOOLS.iter().copied())
                .arg(format!("kernel-devel-{}", release)),
        )
    })?;

    ctx.step(&DNF_BUILD_TREE, |ctx| {
        for dir in RPM_TREE {
            fs::create_dir_all(topdir.join(dir))?;
        }
        ctx.reporter
            .info(format!("Build tree at {}", topdir.display()));
        Ok(())
    })?;

    ctx.step(&DNF_DOWNLOAD, |ctx| {
        ctx.run_best_effort(
            CommandSpec::new("dnf")
                .args(["config-manager", "--set-enabled"])
                .args(SOURCE_REPOS.iter().copied()),
        );
        ctx.run(
            CommandSpec::new("dnf")
                .args(["download", "--source"])
                .arg(format!("kernel-{}", ctx.kernel.base_version()))
                .current_dir(workspace.path()),
        )
    })?;

    let srpm = ctx.step(&DNF_LOCATE_SRPM, |ctx| {
        let srpm = source::find_source_package(workspace.path()).ok_or_else(|| {
            anyhow!(
                "no kernel-*.src.rpm found in {}",
                workspace.path().display()
            )
        })?;
        ctx.reporter.info(format!("Found {}", srpm.display()));
        Ok(srpm)
    })?;

    ctx.step(&DNF_BUILDDEP, |ctx| {
        ctx.run_privileged(
            CommandSpec::new("dnf")
                .args(["builddep", "-y"])
                .path_arg(&srpm),
        )
    })?;

    ctx.step(&DNF_INSTALL_SRPM, |ctx| {
        ctx.run(
            CommandSpec::new("rpm")
                .arg("-i")
                .args(["--define", topdir_define.as_str()])
                .path_arg(&srpm),
        )
    })?;

    ctx.step(&DNF_PREP, |ctx| {
        let specs = topdir.join("SPECS");
        ctx.run(
            CommandSpec::new("rpmbuild")
                .arg("-bp")
                .args(["--define", topdir_define.as_str()])
                .arg(format!("--target={}", ctx.kernel.arch()))
                .arg("kernel.spec")
                .current_dir(&specs),
        )
    })?;

    let tree = ctx.step(&DNF_FIND_TREE, |ctx| {
        let build = topdir.join("BUILD");
        let tree = source::find_kernel_tree(&build).ok_or_else(|| {
            anyhow!(
                "no linux-* directory with a Makefile under {}",
                build.display()
            )
        })?;
        ctx.reporter.info(format!("Source tree {}", tree.display()));
        Ok(tree)
    })?;

    ctx.step(&DNF_EXTRAVERSION, |ctx| patch_version(ctx, &tree))?;

    ctx.step(&DNF_CONFIGURE, |ctx| {
        let boot_config = ctx.config.boot_config(release);
        let dot_config = tree.join(".config");
        fs::copy(&boot_config, &dot_config).map_err(|e| {
            anyhow!("copying {} failed: {}", boot_config.display(), e)
        })?;
        source::enable_module_option(&dot_config, &ctx.config.build.debug_option)?;
        ctx.reporter.info(format!(
            "Enabled {}=m in {}",
            ctx.config.build.debug_option,
            dot_config.display()
        ));
        Ok(())
    })?;

    ctx.step(&DNF_MODULES_PREPARE, |ctx| {
        ctx.run(ctx.make(&tree).arg("modules_prepare"))?;
        copy_symvers(ctx, &tree);
        Ok(())
    })?;

    let driver = &ctx.config.build.driver_subdir;
    ctx.step(&DNF_COMPILE, |ctx| {
        ctx.run(
            ctx.make(&tree)
                .arg(format!("M={}", driver))
                .arg("modules")
                .env("KBUILD_MODPOST_WARN", "1"),
        )
    })?;

    let artifact = ctx.step(&DNF_LOCATE_ARTIFACT, |ctx| {
        let artifact = tree.join(driver).join(ctx.config.artifact_name());
        if !artifact.is_file() {
            return Err(DNF_LOCATE_ARTIFACT.missing(artifact));
        }
        ctx.reporter.info(format!("Built {}", artifact.display()));
        Ok(artifact)
    })?;

    ctx.step(&DNF_INSTALL, |ctx| ctx.install_and_activate(&artifact))
}

fn patch_version(ctx: &StepContext<'_>, tree: &Path) -> Result<()> {
    let release = ctx.kernel.release();
    let extraversion = source::extraversion_for(ctx.kernel).ok_or_else(|| {
        anyhow!(
            "unexpected kernel version format '{}': no '-' suffix",
            release
        )
    })?;
    let makefile = tree.join("Makefile");
    let text = fs::read_to_string(&makefile)?;
    let patched = source::patch_extraversion(&text, &extraversion).ok_or_else(|| {
        anyhow!("no EXTRAVERSION line in {}", makefile.display())
    })?;
    fs::write(&makefile, patched)?;
    ctx.reporter
        .info(format!("Set EXTRAVERSION = {}", extraversion));
    Ok(())
}

/// Copy the installed `Module.symvers`, if any, into the tree.
fn copy_symvers(ctx: &StepContext<'_>, tree: &Path) {
    let symvers = ctx.config.installed_symvers(ctx.kernel.release());
    if !symvers.is_file() {
        tracing::debug!("No installed {}", symvers.display());
        return;
    }
    match fs::copy(&symvers, tree.join("Module.symvers")) {
        Ok(_) => ctx
            .reporter
            .info(format!("Using symbol versions from {}", symvers.display())),
        Err(e) => tracing::warn!("Could not copy {}: {}", symvers.display(), e),
    }
}

