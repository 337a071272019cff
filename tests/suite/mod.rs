//! Integration suite modules.
//!
//! Both modules drive a scripted `/bin/sh` server, so they only run on unix.

#[cfg(unix)]
mod cli;
#[cfg(unix)]
mod session;
