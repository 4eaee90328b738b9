//! `jnu-exam checksum`

use crate::upgrade::ChecksumVerifier;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ChecksumCommand {
    /// File to hash
    pub file: PathBuf,
}

impl ChecksumCommand {
    pub async fn execute(self) -> Result<()> {
        let checksum = ChecksumVerifier::compute_sha256(&self.file).await?;
        println!("{}  {}", checksum, self.file.display());
        Ok(())
    }
}
