//! Sample work orders for trying the tool out (`init --demo`).

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::entity::{FurnitureItem, LifecycleState, WorkOrder};

/// One sample order, dated relative to the day the demo is seeded.
struct Sample {
    id: &'static str,
    name: &'static str,
    place: &'static str,
    due_in_days: i64,
    state: LifecycleState,
    items: &'static [(&'static str, u32)],
    notes: &'static str,
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "demo1",
        name: "Departamento Barrio Norte",
        place: "Av. Santa Fe 2450, CABA",
        due_in_days: 3,
        state: LifecycleState::InProgress,
        items: &[
            ("Placard 3 puertas corredizas", 1),
            ("Cama matrimonial con cabecero", 1),
            ("Mesa de luz", 2),
            ("Cómoda 6 cajones", 1),
        ],
        notes: "Access through the garage, call first. 7th floor, flat B.",
    },
    Sample {
        id: "demo2",
        name: "Casa Palermo Soho",
        place: "Thames 1860, CABA",
        due_in_days: 15,
        state: LifecycleState::Pending,
        items: &[
            ("Sillón 3 cuerpos", 1),
            ("Mesa comedor 8 personas", 1),
            ("Aparador 2 puertas", 1),
            ("Biblioteca esquinera", 6),
        ],
        notes: "Client prefers morning delivery.",
    },
    Sample {
        id: "demo3",
        name: "Oficinas Centro",
        place: "Florida 620 Piso 4, CABA",
        due_in_days: 5,
        state: LifecycleState::InProgress,
        items: &[
            ("Escritorio recto", 6),
            ("Silla ergonómica", 6),
            ("Módulo recepción en L", 1),
        ],
        notes: "Deliver to the 4th floor. Freight elevator available.",
    },
    Sample {
        id: "demo4",
        name: "Dúplex San Isidro",
        place: "Centenario 430, San Isidro",
        due_in_days: 45,
        state: LifecycleState::Pending,
        items: &[
            ("Cocina integral con isla", 1),
            ("Vanitory doble mármol", 1),
            ("Biblioteca living", 1),
        ],
        notes: "",
    },
    Sample {
        id: "demo5",
        name: "Estudio Belgrano",
        place: "Arribeños 2100, CABA",
        due_in_days: -8,
        state: LifecycleState::Done,
        items: &[("Mesa ratona vidrio", 1), ("Estante flotante", 4)],
        notes: "Very happy client.",
    },
];

impl Sample {
    fn build(&self, today: NaiveDate, now: DateTime<Utc>, created_by: &str) -> WorkOrder {
        WorkOrder {
            id: self.id.to_string(),
            name: self.name.to_string(),
            place: self.place.to_string(),
            due_date: today + Duration::days(self.due_in_days),
            state: self.state,
            items: self
                .items
                .iter()
                .map(|(name, qty)| FurnitureItem::new(*name, *qty))
                .collect(),
            notes: self.notes.to_string(),
            created_by: created_by.to_string(),
            created_at: now,
            edited_by: None,
            edited_at: None,
        }
    }
}

/// Five orders spread across every urgency bucket relative to `today`.
pub fn demo_orders(today: NaiveDate, now: DateTime<Utc>, created_by: &str) -> Vec<WorkOrder> {
    SAMPLES
        .iter()
        .map(|sample| sample.build(today, now, created_by))
        .collect()
}
