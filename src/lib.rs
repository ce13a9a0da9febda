/*!
# Skill Matrix

Builds, edits, saves and prints the operator skill matrix of a production
line: one row per person, one column per station, each cell rating the
person's proficiency on that station.

## Overview

The matrix is never stored as a grid of its own. Every time a department and
line are selected it is rebuilt from three sources:

- the department roster (instructor first, then students),
- the station catalog of the line,
- the matrix last saved for that (department, line) pair, if any.

Saved values are carried over for people and stations that still exist;
everything else gets a default. Rows added by hand ("manual" rows) survive as
long as their person is not on the roster.

## Architecture

### Data Layer
- **Directory** - Departments, lines, stations and level labels
- **Matrix Store** - One saved document per (department, line); gzip + bincode files on disk

### Core
- **Roster Resolver** - Department record to ordered roster
- **Matrix Reconciler** - Roster × stations × saved document to working grid
- **Edit Surface** - In-place edits of levels, criticality, codes, stations and manual rows

### Output
- **Report Exporter** - XLSX workbook reproducing the paper form, plus CSV and plain text
- **Session** - Selection, state machine (no line / loaded / saving) and user notices

## Modules

- **level**: Level scale and short label rendering
- **model**: Departments, stations, rows, cells and the saved document
- **roster**: Roster resolution and join date formatting
- **directory**: Directory trait and the in-memory fixture directory
- **store**: Matrix store trait, in-memory and file-backed stores
- **reconcile**: The reconciliation algorithm
- **edit**: The working grid and its edit operations
- **export**: CSV, text and XLSX renditions
- **session**: Page controller
- **config**: Application settings
- **error**: Error type
*/

pub mod config;
pub mod directory;
pub mod edit;
pub mod error;
pub mod export;
pub mod level;
pub mod model;
pub mod reconcile;
pub mod roster;
pub mod session;
pub mod store;

/// Re-export everything from these modules to make it easier to use
pub use config::*;
pub use directory::*;
pub use edit::*;
pub use error::*;
pub use export::*;
pub use level::*;
pub use model::*;
pub use reconcile::*;
pub use roster::*;
pub use session::*;
pub use store::*;
