//! Demo screens

mod light_field;
mod showcase;

pub use light_field::LightFieldScreen;
pub use showcase::ShowcaseScreen;

use deferred_engine::prelude::*;

/// Screen shown first unless `--screen` says otherwise
pub const DEFAULT_SCREEN: &str = ShowcaseScreen::NAME;

const BRICK_MATERIAL: &str = include_str!("../../resources/materials/brick.json");

/// Register every demo screen with the engine
pub fn register_all(engine: &mut Engine) -> Result<(), EngineError> {
    engine.register_screen(ShowcaseScreen::NAME, Box::new(ShowcaseScreen::new()))?;
    engine.register_screen(LightFieldScreen::NAME, Box::new(LightFieldScreen::new()))?;
    Ok(())
}

/// Models and materials shared by the screens. Stores outlive screen
/// switches, so only the first call uploads anything.
fn load_common_assets(ctx: &mut EngineContext) -> Result<(), ScreenError> {
    if ctx.models.contains("cube") {
        return Ok(());
    }
    log::info!("Loading demo assets...");

    let backend = ctx.backend.as_mut();
    ctx.models.load("cube", &ModelData::cube(), backend)?;
    ctx.models.load("plane", &ModelData::plane(30.0), backend)?;

    ctx.materials.load_json("brick", BRICK_MATERIAL, &ctx.textures)?;
    ctx.materials.load("marble", &MaterialDesc::from_color([0.85, 0.85, 0.8]).with_roughness(0.3), &ctx.textures)?;
    ctx.materials.load(
        "gold",
        &MaterialDesc::from_color([1.0, 0.77, 0.34]).with_metallic(1.0).with_roughness(0.25),
        &ctx.textures,
    )?;
    Ok(())
}
