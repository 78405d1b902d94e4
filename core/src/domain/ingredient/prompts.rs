/// Instruction sent with every fridge photo.
pub const VISION_INSTRUCTION: &str = "Analiza esta imagen de una nevera y lista los ingredientes que puedes identificar con nombre de España. Responde solo con la lista de ingredientes separados por comas, sin puntos ni otros caracteres adicionales.";
