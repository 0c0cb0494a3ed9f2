use super::DrugOrderElement;
use crate::context::{FormContext, Mode};
use crate::frequency;
use crate::order::DrugOrder;
use crate::widget::Widget;

impl DrugOrderElement {
    /// Claims the first existing order matching a configured drug and loads it into the widgets.
    ///
    /// New encounters and contexts without a pool leave the element unbound.
    pub(super) fn bind_existing_order(&mut self, ctx: &mut FormContext) {
        match ctx.mode() {
            Mode::Enter => return,
            Mode::Edit | Mode::View => {}
        }
        let Some(pool) = ctx.existing_orders_mut() else {
            return;
        };

        let claimed = self.config.entries().iter().find_map(|entry| {
            if pool.contains_concept(entry.drug.concept) {
                pool.claim(&entry.drug)
            } else {
                None
            }
        });

        match claimed {
            Some(order) => {
                tracing::debug!(order = %order.uuid, drug = %order.drug, "bound existing drug order");
                self.populate(&order);
                self.bound_order = Some(order);
            }
            None => tracing::debug!("no existing drug order matched the configured drugs"),
        }
    }

    fn populate(&mut self, order: &DrugOrder) {
        self.drug.select(order.drug);
        self.start_date.widget.set_initial_value(order.start_date);

        if let Some(fields) = self.dose_frequency.as_mut() {
            fields.dose.widget.set_initial_value(order.dose);
            let (times, days) = order
                .frequency
                .as_deref()
                .map(frequency::split)
                .unwrap_or_default();
            fields
                .frequency
                .widget
                .set_initial_value(non_empty(times));
            fields
                .frequency_week
                .widget
                .set_initial_value(non_empty(days));
        }

        self.discontinued_date
            .widget
            .set_initial_value(order.discontinued_date);

        if let Some(reason) = self.discontinued_reason.as_mut() {
            reason
                .widget
                .set_initial_value(order.discontinued_reason.map(|id| id.to_string()));
        }
        if let Some(instructions) = self.instructions.as_mut() {
            instructions
                .binding
                .widget
                .set_initial_value(order.instructions.clone());
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
