// PlantData CLI - Generate command
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use crate::{CliError, GenerateArgs};
use plantdata_testdata::{generate_plant, DefectConfig, PlantGeneratorConfig};
use tracing::info;

pub fn run(args: &GenerateArgs) -> Result<(), CliError> {
    let mut config = PlantGeneratorConfig::new()
        .with_turbines(args.turbines)
        .with_days(args.days);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.clean {
        config = config.with_defects(DefectConfig::none());
    }

    let plant = generate_plant(&config)?;
    let written = plant.write_to(&args.out)?;

    info!(
        "generated {} turbines x {} samples ({} defects) into {}",
        plant.manifest.turbines.len(),
        plant.manifest.samples,
        plant.manifest.defects.len(),
        args.out.display()
    );
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
