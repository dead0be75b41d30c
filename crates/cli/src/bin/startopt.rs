use anyhow::Result;

fn main() -> Result<()> {
    startopt_cli::main_entry()
}
