// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The value model: boxed values, type tags, the quantity algebra, the
//! collection type, and the model-provider interface.

mod boxed;
mod collection;
mod provider;
mod quantity;
mod types;
mod value;

pub use boxed::BoxedValue;
pub use collection::Collection;
pub use provider::{resource_type_of, EmptyModelProvider, ModelProvider};
pub use quantity::{
    default_unit_converter, is_calendar_unit, Commensurability, DecimalFactor, IdentityUnitConverter, Quantity,
    UnitConverter, CALENDAR_UNITS,
};
pub use types::TypeInfo;
pub use value::RawValue;

#[cfg(feature = "ucum")]
pub use quantity::UcumUnitConverter;
