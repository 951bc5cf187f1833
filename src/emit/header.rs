//! Bundle header (§4.6, §6): the comment banner and `#!/usr/bin/env python3`
//! shebang every emitted bundle starts with, documenting how it was produced
//! without affecting the bundle's behavior.

/// `entry` is the original entry file, recorded for the reader's benefit.
pub fn render(entry: &str) -> String {
    format!(
        "#!/usr/bin/env python3\n\
         # Generated by cribo from {entry} — do not edit by hand.\n\
         # Running this file directly reproduces the behavior of the original\n\
         # multi-module program.\n\n"
    )
}
