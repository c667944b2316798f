//! Source tree discovery and patching.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::kernel::KernelIdentity;

static EXTRAVERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^EXTRAVERSION[ \t]*=.*$").expect("EXTRAVERSION pattern is valid")
});

/// Find the downloaded `kernel-*.src.rpm` directly inside `dir`.
///
/// When several match, the lexically first is used.
pub fn find_source_package(dir: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("kernel-") && n.ends_with(".src.rpm"))
        })
        .collect();
    found.sort();
    found.into_iter().next()
}

/// Depth-first search under `root` for a `linux-*` directory with a
/// top-level `Makefile`. Entries are visited in name order; the first match
/// wins.
pub fn find_kernel_tree(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("linux-"))
                && entry.path().join("Makefile").is_file()
        })
        .map(|entry| entry.into_path())
}

/// `EXTRAVERSION` value for the running kernel: `-` followed by the text
/// after the first `-` of the release. `None` when the release has no suffix.
pub fn extraversion_for(kernel: &KernelIdentity) -> Option<String> {
    kernel.release_suffix().map(|suffix| format!("-{}", suffix))
}

/// Replace the first `EXTRAVERSION =` line of a kernel Makefile.
///
/// Returns `None` when the Makefile has no such line.
pub fn patch_extraversion(makefile: &str, extraversion: &str) -> Option<String> {
    let found = EXTRAVERSION_LINE.find(makefile)?;
    let mut patched = String::with_capacity(makefile.len() + extraversion.len());
    patched.push_str(&makefile[..found.start()]);
    patched.push_str("EXTRAVERSION = ");
    patched.push_str(extraversion);
    patched.push_str(&makefile[found.end()..]);
    Some(patched)
}

/// Append `<option>=m` to a kernel `.config`.
pub fn enable_module_option(config: &Path, option: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(config)?;
    write!(file, "\n{}=m\n", option)
}

/// Minimal Kbuild Makefile building `<module>.o` against `headers`.
pub fn out_of_tree_makefile(module: &str, headers: &Path) -> String {
    format!(
        "obj-m := {}.o\n\nall:\n\t$(MAKE) -C {} M=$(CURDIR) modules\n",
        module,
        headers.display()
    )
}
