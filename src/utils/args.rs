//! Argument normalization utilities.
//!
//! Strips the reserved lifecycle flags from a command line before
//! segmentation. These flags belong to the launcher shell, not to any
//! capability unit, so they must never reach the action stream.

/// Remote-source flag: the launcher already consumed the source it points
/// at, so the flag and its path argument are dropped here.
const REMOTE_FLAGS: [&str; 2] = ["--remote", "-r"];

/// Update flag: survives filtering, with a spelling that depends on where
/// the remote-source flag sat relative to it.
const UPDATE_FLAGS: [&str; 2] = ["--update", "-u"];

fn is_remote_flag(token: &str) -> bool {
    REMOTE_FLAGS.contains(&token)
}

fn is_update_flag(token: &str) -> bool {
    UPDATE_FLAGS.contains(&token)
}

/// Filter the reserved lifecycle flags out of a raw token list.
///
/// The remote-source flag is removed together with its path argument (the
/// first later token that is not the update flag). The update flag is
/// re-emitted at its original position: as the canonical short form `-u`
/// when the remote-source flag preceded it, as the long form `--update`
/// when the remote-source flag followed it (or is absent).
/// Token list for segmentation: `filter_shell_args`, then the retained
/// update spelling dropped as well. The spelling only matters to a host
/// launcher re-invoking itself; no capability unit ever sees either flag.
pub fn action_stream_args(args: &[String]) -> Vec<String> {
    filter_shell_args(args)
        .into_iter()
        .filter(|a| !is_update_flag(a))
        .collect()
}

pub fn filter_shell_args(args: &[String]) -> Vec<String> {
    let remote_pos = args.iter().position(|a| is_remote_flag(a));
    let update_pos = args.iter().position(|a| is_update_flag(a));

    let remote_arg_pos = remote_pos.and_then(|rp| {
        args.iter()
            .enumerate()
            .skip(rp + 1)
            .find(|(_, a)| !is_update_flag(a))
            .map(|(i, _)| i)
    });

    let mut filtered = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        if Some(i) == remote_pos || Some(i) == remote_arg_pos {
            continue;
        }
        if Some(i) == update_pos {
            let spelling = match remote_pos {
                Some(rp) if rp < i => "-u",
                _ => "--update",
            };
            filtered.push(spelling.to_string());
            continue;
        }
        filtered.push(arg.clone());
    }
    filtered
}
