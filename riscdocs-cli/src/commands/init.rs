//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../riscdocs.yml.example");

const DEFAULT_NAVIGATION: &str = r#"{
  "userGuide": {
    "title": "User Guide",
    "path": "/user-guide/root",
    "sections": [
      {
        "title": "Overview",
        "path": "/user-guide/root",
        "icon": "book",
        "description": "What the RISC framework is"
      },
      {
        "title": "Getting Started",
        "path": "/user-guide/getting-started",
        "icon": "cpu",
        "description": "Build and simulate your first core"
      }
    ]
  },
  "devGuide": {
    "title": "Developer Guide",
    "path": "/dev-guide/root",
    "sections": [
      {
        "title": "Overview",
        "path": "/dev-guide/root",
        "icon": "code",
        "description": "Working on the framework itself"
      },
      {
        "title": "How to Draw Waveforms",
        "path": "/dev-guide/how-to-draw-waveforms",
        "icon": "memory",
        "description": "Timing diagrams with WaveDrom blocks"
      },
      {
        "title": "Todo List",
        "path": "/dev-guide/todo-list",
        "icon": "file",
        "description": "Planned work"
      }
    ]
  }
}
"#;

const HOME: &str = r#"---
title: RISC Framework
description: Documentation for the RISC framework
---

# RISC Framework

A configurable RISC-V core generator with simulation and verification flows.

```tip
New here? Start with the user guide.
```

- [User Guide](/user-guide/root)
- [Developer Guide](/dev-guide/root)
"#;

const USER_GUIDE_ROOT: &str = r#"# User Guide

This guide covers building, configuring and simulating cores.

```info
Every page in this guide assumes a working toolchain.
```
"#;

const GETTING_STARTED: &str = r#"# Getting Started

## Prerequisites

- A RISC-V GNU toolchain
- Verilator

## Build

```bash
make build
make sim
```

```success
If the simulation prints `PASS`, your environment is ready.
```
"#;

const DEV_GUIDE_ROOT: &str = r#"# Developer Guide

Notes for people changing the framework itself.

```info
Documentation pages can embed callouts and timing diagrams.
```
"#;

const HOW_TO_DRAW_WAVEFORMS: &str = r#"# How to Draw Waveforms

Fence a WaveJSON object with the `wavedrom` tag:

```wavedrom
{ "signal": [
  { "name": "clk",   "wave": "p......" },
  { "name": "valid", "wave": "0.1..0." },
  { "name": "data",  "wave": "x.345x.", "data": ["A", "B", "C"] },
  { "name": "ready", "wave": "1....0." }
] }
```

```tip
Use `.` to extend the previous state and `p` for a clock.
```
"#;

const TODO_LIST: &str = r#"# Todo List

- [x] Decode stage
- [ ] Branch predictor
- [ ] Cache hierarchy
"#;

/// Initialize a new documentation project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_if_missing(&root.join("riscdocs.yml"), DEFAULT_CONFIG)?;
    write_if_missing(&root.join("navigation.json"), DEFAULT_NAVIGATION)?;
    scaffold_content(root)?;

    println!("✓ riscdocs initialized in {:?}", root);
    println!("  - Edit riscdocs.yml to customize site metadata");
    println!("  - Edit navigation.json to arrange the sidebar");
    println!("  - Write pages in content/");
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let content = root.join("content");
    let pages = [
        ("home.md", HOME),
        ("user-guide/root.md", USER_GUIDE_ROOT),
        ("user-guide/getting-started.md", GETTING_STARTED),
        ("dev-guide/root.md", DEV_GUIDE_ROOT),
        ("dev-guide/how-to-draw-waveforms.md", HOW_TO_DRAW_WAVEFORMS),
        ("dev-guide/todo-list.md", TODO_LIST),
    ];

    for (rel, body) in pages {
        let path = content.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
        }
        write_if_missing(&path, body)?;
    }
    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{:?} already exists, skipping", path);
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Created {:?}", path);
    Ok(())
}
