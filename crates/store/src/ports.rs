// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port window allocation.
//!
//! Worktrees get contiguous port ranges from the bounded pool
//! `[defaults.port_range_start ..= defaults.port_range_end]`, first fit by
//! gap. The reverse index `port_allocations` maps every allocated port back
//! to `(project, worktree, index)` by name. Callers must run these functions
//! inside `Store::batch_mutate` so concurrent allocators never select
//! overlapping windows.

use conductor_core::{Document, Error, PortOwner};

/// Allocate `count` consecutive ports for `(project, worktree)`.
///
/// `count == 0` means "use the project's default, falling back to the
/// global default". Returns the allocated range. Fails with
/// [`Error::NoFreePortWindow`] when no window of the requested width exists.
pub fn allocate_ports(
    doc: &mut Document,
    project: &str,
    worktree: &str,
    count: u16,
) -> Result<Vec<u16>, Error> {
    let count = if count == 0 {
        doc.ports_per_worktree(project)
    } else {
        count
    };

    {
        let wt = doc.worktree(project, worktree)?;
        if wt.is_root {
            return Err(Error::InvariantViolation(format!(
                "root worktree {project}/{worktree} never holds ports"
            )));
        }
        if wt.archived {
            return Err(Error::InvariantViolation(format!(
                "worktree {project}/{worktree} is archived"
            )));
        }
        if !wt.ports.is_empty() {
            return Err(Error::InvariantViolation(format!(
                "worktree {project}/{worktree} already holds ports"
            )));
        }
    }

    let start = find_free_window(doc, count)?;
    let ports: Vec<u16> = (0..count).map(|i| start + i).collect();

    for (i, port) in ports.iter().enumerate() {
        doc.port_allocations.insert(
            *port,
            PortOwner {
                project: project.to_string(),
                worktree: worktree.to_string(),
                index: i as u16,
            },
        );
    }
    doc.worktree_mut(project, worktree)?.ports = ports.clone();

    Ok(ports)
}

/// First-fit scan for a free window of `count` consecutive ports.
fn find_free_window(doc: &Document, count: u16) -> Result<u16, Error> {
    let range_start = doc.defaults.port_range_start;
    let range_end = doc.defaults.port_range_end;
    if count == 0 || u32::from(range_start) + u32::from(count) - 1 > u32::from(range_end) {
        return Err(Error::NoFreePortWindow { requested: count });
    }

    // u32 arithmetic so a pool ending at 65535 cannot overflow the scan
    let width = u32::from(count);
    let last_start = u32::from(range_end) - (width - 1);
    let mut p = u32::from(range_start);
    while p <= last_start {
        let window = p..p + width;
        match window
            .clone()
            .find(|q| doc.port_allocations.contains_key(&(*q as u16)))
        {
            None => return Ok(p as u16),
            // Skip past the blocking allocation
            Some(taken) => p = taken + 1,
        }
    }
    Err(Error::NoFreePortWindow { requested: count })
}

/// Remove this worktree's entries from the reverse index and clear its
/// `ports`. Idempotent: a second call is a no-op.
pub fn free_worktree_ports(doc: &mut Document, project: &str, worktree: &str) -> Result<(), Error> {
    let ports = doc.worktree(project, worktree)?.ports.clone();
    for port in &ports {
        doc.port_allocations.remove(port);
    }
    doc.worktree_mut(project, worktree)?.ports.clear();
    Ok(())
}

/// Remove every allocation owned by a project (project removal).
pub fn free_project_ports(doc: &mut Document, project: &str) {
    doc.port_allocations
        .retain(|_, owner| owner.project != project);
    if let Some(p) = doc.projects.get_mut(project) {
        for wt in p.worktrees.values_mut() {
            wt.ports.clear();
        }
    }
}

/// Check the port-allocation invariants, returning a description of the
/// first violation. Used by property tests and debug assertions; never
/// called on hot paths.
pub fn verify_port_invariants(doc: &Document) -> Result<(), String> {
    use std::collections::BTreeSet;

    let mut reachable = BTreeSet::new();
    for (pname, wname, wt) in doc.all_worktrees() {
        if wt.is_root && !wt.ports.is_empty() {
            return Err(format!("root worktree {pname}/{wname} holds ports"));
        }
        if wt.is_root && wt.archived {
            return Err(format!("root worktree {pname}/{wname} is archived"));
        }
        if wt.archived && !wt.ports.is_empty() {
            return Err(format!("archived worktree {pname}/{wname} holds ports"));
        }
        for (i, window) in wt.ports.windows(2).enumerate() {
            if window[1] != window[0] + 1 {
                return Err(format!(
                    "worktree {pname}/{wname} ports not contiguous at index {i}"
                ));
            }
        }
        for (i, port) in wt.ports.iter().enumerate() {
            let owner = doc
                .port_allocations
                .get(port)
                .ok_or_else(|| format!("port {port} of {pname}/{wname} missing from index"))?;
            if owner.project != pname || owner.worktree != wname || usize::from(owner.index) != i {
                return Err(format!("port {port} owner mismatch for {pname}/{wname}"));
            }
            if !reachable.insert(*port) {
                return Err(format!("port {port} reachable from two worktrees"));
            }
        }
    }

    for port in doc.port_allocations.keys() {
        if !reachable.contains(port) {
            return Err(format!("port {port} in index but reachable from no worktree"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
