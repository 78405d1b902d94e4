use crate::domain::recipe::entities::RecipeRequest;

pub const RECIPE_SYSTEM_PROMPT: &str = "Eres un chef profesional con más de 20 años de experiencia en cocina internacional, especializado en crear recetas caseras deliciosas, prácticas y accesibles para cocineros de todos los niveles.

Tu tarea es crear recetas que sean:
- Fáciles de seguir, incluso para principiantes
- Con ingredientes accesibles
- Con instrucciones claras y precisas
- Incluyendo consejos profesionales para mejorar los resultados
- Con un toque personal y amigable

Siempre responde en español y usa un tono cercano y motivador.";

const RECIPE_INTRO: &str = "Rol: Eres un chef profesional con más de 20 años de experiencia en cocina internacional, especializado en crear recetas caseras deliciosas, prácticas y accesibles para cocineros de todos los niveles.

Instrucciones:
1. Recibes como entrada una lista de ingredientes disponibles, un estilo de cocina (opcional) y restricciones por alergias (opcional).
2. Genera UNA receta que:
   - Aproveche al máximo los ingredientes proporcionados.
   - Sea fácil de preparar en cualquier cocina doméstica.
   - Tenga un equilibrio perfecto de sabores y texturas.
   - Sea visualmente atractiva y apetitosa.
   - Incluya consejos profesionales para mejorar el resultado final.
   - No contenga ningún ingrediente de las restricciones alimentarias, ni siquiera como alternativa.";

const RECIPE_FORMAT: &str = "Por favor, proporciona la receta con el siguiente formato:

# [NOMBRE DE LA RECETA]
*(Un nombre creativo y apetitoso que refleje la esencia del plato)*

## 🛒 INGREDIENTES
- Lista clara de ingredientes con cantidades específicas (ej: 2 cucharadas, 1 taza, 200g)
- Alternativas posibles para ingredientes que podrían faltar
- Especificar si algún ingrediente es opcional

## ⏱ TIEMPO DE PREPARACIÓN
- Preparación: [X] minutos
- Cocción: [Y] minutos
- Total: [X+Y] minutos

## 🎚 DIFICULTAD
- Nivel: Fácil/Medio/Difícil
- Técnicas requeridas: [listar técnicas]

## 👨‍🍳 PREPARACIÓN
1. Instrucciones claras y secuenciales, numeradas.
2. Incluir tiempos aproximados para cada paso importante.
3. Señalar puntos clave donde el cocinero debe prestar atención.
4. Incluir consejos de presentación.

## 💡 CONSEJOS DEL CHEF
- Trucos profesionales para mejorar el sabor
- Cómo saber cuándo está en su punto
- Posibles variaciones de la receta
- Cómo conservar y recalentar si es necesario

## 🛍 LISTA DE COMPRAS SUGERIDA
*(Solo incluir ingredientes que no estén en la lista original)*
- Ingredientes esenciales para esta receta:
  - [ ] Ingrediente 1 (cantidad)
  - [ ] Ingrediente 2 (cantidad)
- Básicos de despensa recomendados:
  - [ ] Ingrediente básico 1
  - [ ] Ingrediente básico 2

[Nota: La receta debe ser clara, precisa y fácil de seguir incluso para principiantes. Usar un tono cercano y motivador.]";

/// Builds the user prompt for one recipe of a batch.
pub fn build_recipe_prompt(request: &RecipeRequest<'_>) -> String {
    let mut sections = vec![RECIPE_INTRO.to_string()];

    let ingredients = request
        .ingredients
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(format!("Ingredientes disponibles:\n{}", ingredients));

    let allergies = request
        .allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>();
    if !allergies.is_empty() {
        sections.push(format!(
            "🚫 RESTRICCIONES ALIMENTARIAS: {}",
            allergies.join(", ")
        ));
    }

    if let Some(cuisine) = request.cuisine_type.map(str::trim).filter(|c| !c.is_empty()) {
        sections.push(format!("🌍 ESTILO CULINARIO: {}", capitalize(cuisine)));
    }

    if request.total > 1 {
        let mut variation = format!(
            "Esta es la receta {} de {}.",
            request.index, request.total
        );
        if !request.previous_titles.is_empty() {
            variation.push_str(&format!(
                " Propón un plato claramente distinto de: {}.",
                request.previous_titles.join("; ")
            ));
        }
        sections.push(variation);
    }

    sections.push(RECIPE_FORMAT.to_string());
    sections.join("\n\n")
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
