use crate::compile::plan::{
    BlendPass, DrawOp, MaskResolvePass, Pass, PresentPass, RenderPlan, SurfaceDesc, SurfaceId,
};
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::render::backend::{Frame, FrameRGBA};

/// Per-pass hooks a renderer implements; [`execute_plan`] drives them in plan order.
///
/// Scene passes are split into `bind`, one `draw` per op, and `unbind`. At most one surface is
/// bound at a time.
pub trait PassBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> LayerplayResult<()>;

    fn clear(&mut self, target: SurfaceId) -> LayerplayResult<()>;

    fn bind(&mut self, target: SurfaceId) -> LayerplayResult<()>;

    /// Draw into the bound surface. `masks` are the resolved mask surfaces `[a, b]`.
    fn draw(&mut self, op: &DrawOp, masks: [SurfaceId; 2]) -> LayerplayResult<()>;

    fn unbind(&mut self) -> LayerplayResult<()>;

    fn exec_mask_resolve(&mut self, pass: &MaskResolvePass) -> LayerplayResult<()>;

    fn exec_blend(&mut self, pass: &BlendPass) -> LayerplayResult<()>;

    fn exec_present(&mut self, pass: &PresentPass) -> LayerplayResult<()>;

    fn readback_rgba8(&mut self, surface: SurfaceId, plan: &RenderPlan) -> LayerplayResult<FrameRGBA>;
}

/// Check surface references and bind targets before anything executes.
pub fn validate_plan(plan: &RenderPlan) -> LayerplayResult<()> {
    let declared = |id: SurfaceId| {
        if id.index() < plan.surfaces.len() {
            Ok(())
        } else {
            Err(LayerplayError::evaluation(format!(
                "surface {id:?} is not declared by the plan"
            )))
        }
    };

    for (i, pass) in plan.passes.iter().enumerate() {
        match pass {
            Pass::Clear(p) => p.targets.iter().try_for_each(|&t| declared(t))?,
            Pass::Scene(p) => {
                declared(p.target)?;
                p.masks.iter().try_for_each(|&m| declared(m))?;
                if !p.target.is_drawable() {
                    return Err(LayerplayError::evaluation(format!(
                        "pass {i}: surface {:?} cannot be bound as a scene target",
                        p.target
                    )));
                }
                if p.masks.contains(&p.target) {
                    return Err(LayerplayError::evaluation(format!(
                        "pass {i}: scene target {:?} is also sampled as a mask",
                        p.target
                    )));
                }
            }
            Pass::MaskResolve(p) => {
                declared(p.input)?;
                declared(p.output)?;
                if !plan.masks.contains(&p.output) {
                    return Err(LayerplayError::evaluation(format!(
                        "pass {i}: mask resolve writes {:?}, which is not a mask surface",
                        p.output
                    )));
                }
            }
            Pass::Blend(p) => {
                declared(p.src)?;
                declared(p.dst)?;
                if p.src == p.dst {
                    return Err(LayerplayError::evaluation(format!(
                        "pass {i}: blend source and destination are both {:?}",
                        p.src
                    )));
                }
            }
            Pass::Present(p) => {
                declared(p.src)?;
                declared(p.target)?;
            }
        }
    }
    declared(plan.final_surface)?;
    plan.masks.iter().try_for_each(|&m| declared(m))
}

pub fn execute_plan<B: PassBackend + ?Sized>(
    backend: &mut B,
    plan: &RenderPlan,
) -> LayerplayResult<Frame> {
    validate_plan(plan)?;

    for (idx, desc) in plan.surfaces.iter().enumerate() {
        let id = SurfaceId(
            idx.try_into()
                .map_err(|_| LayerplayError::evaluation("surface id overflow"))?,
        );
        backend.ensure_surface(id, desc)?;
    }

    for pass in &plan.passes {
        match pass {
            Pass::Clear(p) => {
                for &t in &p.targets {
                    backend.clear(t)?;
                }
            }
            Pass::Scene(p) => {
                backend.bind(p.target)?;
                for op in &p.ops {
                    backend.draw(op, p.masks)?;
                }
                backend.unbind()?;
            }
            Pass::MaskResolve(p) => backend.exec_mask_resolve(p)?,
            Pass::Blend(p) => backend.exec_blend(p)?,
            Pass::Present(p) => backend.exec_present(p)?,
        }
    }

    Ok(Frame {
        color: backend.readback_rgba8(plan.final_surface, plan)?,
        masks: [
            backend.readback_rgba8(plan.masks[0], plan)?,
            backend.readback_rgba8(plan.masks[1], plan)?,
        ],
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/passes.rs"]
mod tests;
