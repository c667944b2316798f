//! Out-of-tree single-file build for apt/dpkg hosts.
//!
//! Debian-family kernels ship a usable header tree, so only the driver
//! source is fetched from the upstream tag and built against it.

use std::fs;
use std::path::PathBuf;

use anyhow::anyhow;

use crate::error::Result;

use super::context::StepContext;
use super::source;
use super::steps::*;
use super::workspace::BuildWorkspace;

/// Run every apt step in order and return the installed module path.
pub fn provision(ctx: &StepContext<'_>, workspace: &BuildWorkspace) -> Result<PathBuf> {
    let release = ctx.kernel.release();
    let module = &ctx.config.module.name;

    let headers = ctx.step(&APT_CHECK_HEADERS, |ctx| {
        let headers = ctx.config.headers_dir(release);
        if !headers.is_dir() {
            return Err(anyhow!(
                "kernel headers not found at {}; install them with: sudo apt-get install linux-headers-{}",
                headers.display(),
                release
            )
            .into());
        }
        ctx.reporter
            .info(format!("Using headers at {}", headers.display()));
        Ok(headers)
    })?;

    let build_dir = ctx.step(&APT_WORKSPACE, |ctx| {
        let dir = workspace.path().join(module);
        fs::create_dir_all(&dir)?;
        ctx.reporter.info(format!("Working in {}", dir.display()));
        Ok(dir)
    })?;

    ctx.step(&APT_FETCH, |ctx| {
        let url = ctx
            .config
            .upstream_source_url(ctx.kernel.upstream_version());
        let dest = build_dir.join(ctx.config.source_name());
        ctx.reporter.command(format!("Downloading {}", url));
        let size = ctx.fetcher.fetch_to(&url, &dest)?;
        ctx.reporter
            .info(format!("Saved {} ({} bytes)", dest.display(), size));
        Ok(())
    })?;

    ctx.step(&APT_MAKEFILE, |_| {
        fs::write(
            build_dir.join("Makefile"),
            source::out_of_tree_makefile(module, &headers),
        )?;
        Ok(())
    })?;

    ctx.step(&APT_COMPILE, |ctx| ctx.run(ctx.make(&build_dir)))?;

    ctx.step(&APT_INSTALL, |ctx| {
        let artifact = build_dir.join(ctx.config.artifact_name());
        if !artifact.is_file() {
            return Err(APT_INSTALL.missing(artifact));
        }
        ctx.install_and_activate(&artifact)
    })
}
