// Shared build-script helper: turns a crate README into its rustdoc front page.
// Include this in build.rs files with: include!("../build_common.rs");
//
// Required imports in the including file:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Rewrite `README.md` links so they resolve inside rustdoc and write the
/// result to `$OUT_DIR/README_GENERATED.md`.
///
/// - `src/foo.rs` and `src/foo/mod.rs` become the module path `foo`.
/// - `../voicebot-bar` (a sibling crate) becomes the crate path `voicebot_bar`.
///
/// A crate without a README still gets an empty page so that `include_str!`
/// in `lib.rs` always resolves.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let readme = fs::read_to_string(Path::new(crate_dir).join("README.md")).unwrap_or_default();
    let page = rewrite_readme_links(&readme);

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), page)
        .expect("OUT_DIR is writable");
}

fn rewrite_readme_links(readme: &str) -> String {
    let page = readme
        .replace("/mod.rs)", ")")
        .replace("](src/", "](")
        .replace(".rs)", ")");

    let mut rest = page.as_str();
    let mut out = String::with_capacity(page.len());
    while let Some(at) = rest.find("](../voicebot-") {
        let (before, after) = rest.split_at(at);
        out.push_str(before);
        out.push_str("](voicebot_");
        let tail = &after["](../voicebot-".len()..];
        let name_len = tail.find(')').unwrap_or(tail.len());
        out.push_str(&tail[..name_len].replace('-', "_"));
        rest = &tail[name_len..];
    }
    out.push_str(rest);
    out
}
