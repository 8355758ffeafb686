use super::cost_model::FeeModel;
use crate::domain::{CombinationId, OrderSettings, Side, StaticVariables};

/// Read-only inputs shared by every bar of one combination.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    pub statics: &'a StaticVariables,
    pub settings: OrderSettings,
    pub side: Side,
    pub fees: FeeModel,
    pub combination: CombinationId,
}

impl<'a> OrderContext<'a> {
    pub fn new(statics: &'a StaticVariables, settings: OrderSettings, combination: CombinationId) -> Self {
        Self {
            statics,
            settings,
            side: statics.side(),
            fees: FeeModel::new(statics.fee_pct),
            combination,
        }
    }
}
